//! Dataset reference store with LRU eviction and TTL expiry.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use candela_types::{CandelaError, StoreConfig};
use lru::LruCache;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Candle, RawCandle};

/// Opaque reference to a cached dataset snapshot.
///
/// 128 random bits, minted once per ingested dataset from the OS-seeded
/// generator; collision probability is negligible so no uniqueness probe is
/// performed. The textual form is 32 lowercase hex digits, and the id
/// serializes as that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DatasetId(u128);

impl DatasetId {
    fn mint() -> Self {
        Self(rand::rng().random())
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for DatasetId {
    type Err = CandelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 32
            && s.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(bits) = u128::from_str_radix(s, 16)
        {
            return Ok(Self(bits));
        }
        Err(CandelaError::invalid_arg(format!(
            "malformed dataset reference '{s}'"
        )))
    }
}

impl From<DatasetId> for String {
    fn from(id: DatasetId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for DatasetId {
    type Error = CandelaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Cache payload: rows as ingested, or rows repaired by the cleaning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    /// Externally ingested rows, not yet cleaned.
    Raw(Vec<RawCandle>),
    /// Rows repaired by the cleaning engine.
    Clean(Vec<Candle>),
}

struct Entry {
    snapshot: Snapshot,
    expires_at: Option<Instant>,
}

/// Keyed store handing dataset snapshots between processing stages.
///
/// An explicit, constructor-injected object: no component reaches a dataset
/// except through a reference obtained from [`DatasetStore::put`]. Least
/// recently used entries are evicted at capacity and expired entries are
/// dropped on access. Individual operations are atomic, but the calling
/// protocol remains single-writer per reference.
pub struct DatasetStore {
    inner: Mutex<LruCache<DatasetId, Entry>>,
    ttl: Option<Duration>,
}

impl DatasetStore {
    /// Build a store from its configuration.
    #[must_use]
    pub fn new(cfg: StoreConfig) -> Self {
        // Avoid zero capacity panics
        let cap = NonZeroUsize::new(cfg.max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            ttl: cfg.ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<DatasetId, Entry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deadline(&self) -> Option<Instant> {
        self.ttl.map(|ttl| Instant::now() + ttl)
    }

    /// Store a freshly ingested snapshot and mint its reference.
    pub fn put(&self, snapshot: Snapshot) -> DatasetId {
        let id = DatasetId::mint();
        let entry = Entry {
            snapshot,
            expires_at: self.deadline(),
        };
        self.lock().put(id, entry);
        id
    }

    /// Current snapshot under `id`, or `None` for an unknown or expired
    /// reference.
    #[must_use]
    pub fn get(&self, id: &DatasetId) -> Option<Snapshot> {
        let mut guard = self.lock();
        if let Some(entry) = guard.get_mut(id)
            && entry.expires_at.is_none_or(|t| Instant::now() <= t)
        {
            return Some(entry.snapshot.clone());
        }
        // If expired, remove it and return None
        guard.pop(id).and_then(|_| None)
    }

    /// Overwrite the snapshot under `id` in place, refreshing its expiry
    /// deadline. The reference itself never changes. Returns `false` for an
    /// unknown or expired reference, in which case nothing is stored.
    pub fn replace(&self, id: &DatasetId, snapshot: Snapshot) -> bool {
        let deadline = self.deadline();
        let now = Instant::now();
        let mut guard = self.lock();
        let live = match guard.peek(id) {
            Some(entry) => entry.expires_at.is_none_or(|t| now <= t),
            None => return false,
        };
        if live {
            guard.put(
                *id,
                Entry {
                    snapshot,
                    expires_at: deadline,
                },
            );
            true
        } else {
            guard.pop(id);
            false
        }
    }

    /// Number of resident snapshots, counting entries that have expired but
    /// not yet been dropped on access.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no snapshots are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetStore")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
