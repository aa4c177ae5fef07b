use std::time::Duration;

use candela_core::{Candle, DatasetId, DatasetStore, RawCandle, Snapshot, StoreConfig};
use chrono::{DateTime, Utc};

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn raw_rows() -> Vec<RawCandle> {
    vec![RawCandle {
        ts: "2024-01-01".into(),
        open: Some(10.0),
        high: Some(11.0),
        low: Some(9.0),
        close: Some(10.5),
        volume: Some(100.0),
    }]
}

fn clean_rows() -> Vec<Candle> {
    vec![Candle {
        ts: t(0),
        open: Some(10.0),
        high: Some(11.0),
        low: Some(9.0),
        close: Some(10.5),
        volume: Some(100.0),
    }]
}

#[test]
fn put_then_get_round_trips() {
    let store = DatasetStore::default();
    let id = store.put(Snapshot::Raw(raw_rows()));
    assert_eq!(store.get(&id), Some(Snapshot::Raw(raw_rows())));
}

#[test]
fn distinct_ingestions_get_distinct_references() {
    let store = DatasetStore::default();
    let a = store.put(Snapshot::Raw(raw_rows()));
    let b = store.put(Snapshot::Raw(raw_rows()));
    assert_ne!(a, b);
}

#[test]
fn replace_overwrites_in_place_and_keeps_the_reference() {
    let store = DatasetStore::default();
    let id = store.put(Snapshot::Raw(raw_rows()));
    assert!(store.replace(&id, Snapshot::Clean(clean_rows())));
    assert_eq!(store.get(&id), Some(Snapshot::Clean(clean_rows())));
    assert_eq!(store.len(), 1);
}

#[test]
fn unknown_reference_misses() {
    let store = DatasetStore::default();
    let id: DatasetId = "00000000000000000000000000000001".parse().unwrap();
    assert_eq!(store.get(&id), None);
    assert!(!store.replace(&id, Snapshot::Raw(raw_rows())));
}

#[test]
fn lru_evicts_the_least_recently_used_entry() {
    let store = DatasetStore::new(StoreConfig {
        max_entries: 2,
        ttl: None,
    });
    let a = store.put(Snapshot::Raw(raw_rows()));
    let b = store.put(Snapshot::Raw(raw_rows()));
    assert!(store.get(&a).is_some()); // touch a, b becomes least recent
    let c = store.put(Snapshot::Raw(raw_rows()));
    assert!(store.get(&b).is_none());
    assert!(store.get(&a).is_some());
    assert!(store.get(&c).is_some());
}

#[test]
fn capacity_one_keeps_only_the_latest() {
    let store = DatasetStore::new(StoreConfig {
        max_entries: 1,
        ttl: None,
    });
    let a = store.put(Snapshot::Raw(raw_rows()));
    let b = store.put(Snapshot::Raw(raw_rows()));
    assert!(store.get(&a).is_none());
    assert!(store.get(&b).is_some());
}

#[test]
fn ttl_expiry_behaves_as_absent() {
    let store = DatasetStore::new(StoreConfig {
        max_entries: 8,
        ttl: Some(Duration::from_millis(30)),
    });
    let id = store.put(Snapshot::Raw(raw_rows()));
    assert!(store.get(&id).is_some());
    std::thread::sleep(Duration::from_millis(60));
    assert!(store.get(&id).is_none());
    assert!(!store.replace(&id, Snapshot::Clean(clean_rows())));
}

#[test]
fn replace_refreshes_the_ttl_deadline() {
    let store = DatasetStore::new(StoreConfig {
        max_entries: 8,
        ttl: Some(Duration::from_millis(80)),
    });
    let id = store.put(Snapshot::Raw(raw_rows()));
    std::thread::sleep(Duration::from_millis(50));
    assert!(store.replace(&id, Snapshot::Clean(clean_rows())));
    std::thread::sleep(Duration::from_millis(50));
    // 100ms after put, but only 50ms after the refreshing replace
    assert!(store.get(&id).is_some());
}

#[test]
fn dataset_id_round_trips_through_text_and_serde() {
    let store = DatasetStore::default();
    let id = store.put(Snapshot::Raw(raw_rows()));

    let text = id.to_string();
    assert_eq!(text.len(), 32);
    assert!(text.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(text.parse::<DatasetId>().unwrap(), id);

    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{text}\""));
    assert_eq!(serde_json::from_str::<DatasetId>(&json).unwrap(), id);
}

#[test]
fn malformed_references_are_rejected() {
    for bad in ["", "xyz", "123", "zz000000000000000000000000000000"] {
        assert!(bad.parse::<DatasetId>().is_err(), "accepted '{bad}'");
    }
}
