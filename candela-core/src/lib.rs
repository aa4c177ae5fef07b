//! candela-core
//!
//! Series repair, regime statistics, and the dataset reference store shared
//! across the candela ecosystem.
//!
//! - `types`: the raw ingestion row and the canonical tri-state candle.
//! - `store`: the [`DatasetStore`] handing snapshots between stages by
//!   opaque reference.
//! - `series`: the cleaning engine turning irregular input into a gap-free,
//!   internally consistent grid.
//! - `stats`: return-distribution and autocorrelation diagnostics over a
//!   repaired series.
//! - `mediator`: the two adapters that touch the store and an engine at the
//!   same time.
//!
//! Every operation here is a plain synchronous call that runs to completion;
//! nothing performs I/O. The calling protocol is single-writer per dataset
//! reference: individual store operations are atomic, but concurrent cleaning
//! of the same reference is out of contract.
#![warn(missing_docs)]

pub mod mediator;
pub mod series;
pub mod stats;
pub mod store;
pub mod types;

pub use candela_types::{
    CandelaError, CleanConfig, CleanReport, Frequency, StatsConfig, StoreConfig,
};
pub use mediator::{CleanReceipt, analyze_by_id, clean_by_id};
pub use series::clean::{CleanOutcome, clean_candles, clean_raw};
pub use series::infer::estimate_step_seconds;
pub use stats::autocorr::{AutocorrelationStats, LagCorrelation};
pub use stats::distribution::DistributionStats;
pub use stats::{RegimeDiagnostics, analyze};
pub use store::{DatasetId, DatasetStore, Snapshot};
pub use types::{Candle, RawCandle};
