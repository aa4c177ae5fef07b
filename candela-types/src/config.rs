//! Configuration types shared across the cleaning, statistics, and store layers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Grid frequency for a repaired series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Frequency {
    /// Infer the step as the lower median of positive adjacent timestamp deltas.
    #[default]
    Auto,
    /// Explicit step length in seconds. Must be strictly positive.
    Seconds(i64),
}

/// Configuration for the cleaning engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Target grid frequency for the repaired series.
    pub frequency: Frequency,
    /// Repair rows whose OHLC fields contradict each other (e.g. low > high).
    /// Repair only reorders and clamps already-present values; it never
    /// fabricates a value for a missing field.
    pub repair_ohlc: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::Auto,
            repair_ohlc: true,
        }
    }
}

/// Configuration for the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Short analysis window, in return observations. Must be at least 2.
    pub short_window: usize,
    /// Long analysis window, in return observations. Must be at least 2.
    pub long_window: usize,
    /// Periods per year used to annualize volatility.
    pub periods_per_year: f64,
    /// Largest autocorrelation lag to compute, capped at one less than the
    /// number of return observations. Must be at least 1.
    pub max_lag: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            short_window: 60,
            long_window: 252,
            periods_per_year: 365.0,
            max_lag: 10,
        }
    }
}

/// Configuration for the dataset reference store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of resident snapshots; least-recently-used entries are
    /// evicted beyond this. Treated as 1 if set to zero.
    pub max_entries: usize,
    /// Optional time-to-live per entry; `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl: None,
        }
    }
}
