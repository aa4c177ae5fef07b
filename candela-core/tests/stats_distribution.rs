use candela_core::{CandelaError, Candle, StatsConfig, analyze};
use chrono::{DateTime, Utc};

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            ts: t(i64::try_from(i).unwrap() * 3600),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(1.0),
        })
        .collect()
}

fn cfg(short: usize, long: usize) -> StatsConfig {
    StatsConfig {
        short_window: short,
        long_window: long,
        ..StatsConfig::default()
    }
}

/// 61 closes alternating 100, 120 give 60 returns alternating +-ln(1.2):
/// every shape statistic has a closed form.
#[test]
fn alternating_series_matches_closed_forms() {
    let closes: Vec<f64> = (0..61).map(|i| if i % 2 == 0 { 100.0 } else { 120.0 }).collect();
    let out = analyze(&candles_from_closes(&closes), &cfg(60, 60)).unwrap();
    let s = &out.short_term;

    assert_eq!(s.window, 60);
    assert_eq!(s.observations, 60);
    assert!(!s.truncated);
    // Up and down returns cancel exactly
    assert_eq!(s.mean_return_pct, 0.0);
    assert_eq!(s.skewness, 0.0);
    // Two-point symmetric distribution: m4 / m2^2 = 1, excess = -2
    assert_eq!(s.kurtosis_excess, -2.0);
    // |r| never exceeds twice the standard deviation
    assert_eq!(s.extreme_up_moves_pct, 0.0);
    assert_eq!(s.extreme_down_moves_pct, 0.0);
    // Peak 120 to trough 100
    assert_eq!(s.max_drawdown_pct, 16.67);
    // JB = n/6 * (0 + (-2)^2 / 4) = 10; p = exp(-10/2)
    assert_eq!(s.normality_p_value, 0.0067);

    // Sample stdev of +-ln(1.2) about a zero mean, annualized at 365
    let r = 1.2f64.ln();
    let expected_vol = r * (60.0f64 / 59.0).sqrt() * 365.0f64.sqrt() * 100.0;
    assert!(
        (s.annualized_volatility_pct - expected_vol).abs() < 0.05,
        "vol {} vs {}",
        s.annualized_volatility_pct,
        expected_vol
    );

    // Identical windows produce identical records
    assert_eq!(out.long_term, out.short_term);
}

#[test]
fn rising_series_has_zero_drawdown() {
    let mut closes = vec![100.0];
    for i in 0..30 {
        let factor = if i % 2 == 0 { 1.01 } else { 1.02 };
        closes.push(closes[closes.len() - 1] * factor);
    }
    let out = analyze(&candles_from_closes(&closes), &cfg(10, 30)).unwrap();
    assert_eq!(out.short_term.max_drawdown_pct, 0.0);
    assert_eq!(out.long_term.max_drawdown_pct, 0.0);
    assert!(out.short_term.mean_return_pct > 0.0);
}

#[test]
fn drawdown_uses_window_plus_one_prices() {
    // Trailing 3 closes for a 2-return window: 200 peak, 190 trough.
    let closes = [100.0, 200.0, 190.0, 195.0];
    let out = analyze(&candles_from_closes(&closes), &cfg(2, 3)).unwrap();
    assert_eq!(out.short_term.max_drawdown_pct, 5.0);
}

#[test]
fn oversized_window_truncates_with_a_flag() {
    // 10 closes = 9 returns; the long window cannot be satisfied.
    let closes: Vec<f64> = (0..10).map(|i| 100.0 + f64::from(i % 3)).collect();
    let out = analyze(&candles_from_closes(&closes), &cfg(5, 252)).unwrap();

    assert!(!out.short_term.truncated);
    assert_eq!(out.short_term.observations, 5);

    assert!(out.long_term.truncated);
    assert_eq!(out.long_term.window, 252);
    assert_eq!(out.long_term.observations, 9);
}

#[test]
fn fewer_than_two_returns_fail() {
    let closes = [100.0, 101.0];
    let err = analyze(&candles_from_closes(&closes), &cfg(2, 2)).unwrap_err();
    assert!(matches!(err, CandelaError::Computation(_)));
}

#[test]
fn flat_series_has_no_defined_shape() {
    let closes = [100.0; 20];
    let err = analyze(&candles_from_closes(&closes), &cfg(5, 10)).unwrap_err();
    match err {
        CandelaError::Computation(msg) => assert!(msg.contains("zero variance")),
        other => panic!("expected computation error, got {other:?}"),
    }
}

#[test]
fn uncleaned_rows_are_rejected() {
    let mut candles = candles_from_closes(&[100.0, 101.0, 102.0, 103.0]);
    candles[2].close = None;
    let err = analyze(&candles, &cfg(2, 3)).unwrap_err();
    assert!(matches!(err, CandelaError::Validation(_)));
}

#[test]
fn diagnostics_round_trip_through_json() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i % 5)).collect();
    let out = analyze(&candles_from_closes(&closes), &cfg(10, 20)).unwrap();
    let json = serde_json::to_string(&out).unwrap();
    let back: candela_core::RegimeDiagnostics = serde_json::from_str(&json).unwrap();
    assert_eq!(back, out);
}

#[test]
fn degenerate_configs_are_rejected() {
    let candles = candles_from_closes(&[100.0, 101.0, 103.0, 102.0]);
    for bad in [
        cfg(1, 10),
        cfg(10, 1),
        StatsConfig {
            max_lag: 0,
            ..StatsConfig::default()
        },
        StatsConfig {
            periods_per_year: 0.0,
            ..StatsConfig::default()
        },
        StatsConfig {
            periods_per_year: f64::NAN,
            ..StatsConfig::default()
        },
    ] {
        assert!(matches!(
            analyze(&candles, &bad),
            Err(CandelaError::InvalidArg(_))
        ));
    }
}
