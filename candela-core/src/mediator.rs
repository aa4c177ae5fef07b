//! Adapters wiring the dataset store to the processing engines.
//!
//! These are the only components that touch the store and an engine at the
//! same time. [`clean_by_id`] replaces the cached snapshot in place under the
//! same reference; [`analyze_by_id`] only reads.

use candela_types::{CandelaError, CleanConfig, CleanReport, StatsConfig};
use serde::{Deserialize, Serialize};

use crate::series::clean::{CleanOutcome, clean_candles, clean_raw};
use crate::stats::{self, RegimeDiagnostics};
use crate::store::{DatasetId, DatasetStore, Snapshot};

/// Acknowledgement that a cached dataset was repaired in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReceipt {
    /// Reference the repaired snapshot is still stored under.
    pub id: DatasetId,
    /// Corrections applied by the cleaning engine.
    pub report: CleanReport,
}

/// Repair the snapshot stored under `id` and write it back under the same
/// reference.
///
/// A raw snapshot is normalized and repaired; re-cleaning an already-clean
/// snapshot is a no-op with an empty report. On any failure nothing is
/// written back and the cached snapshot is left as it was.
///
/// # Errors
/// Returns [`CandelaError::UnknownReference`] for an unknown or expired
/// reference, and propagates every cleaning failure.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "candela::mediator::clean_by_id", skip(store, cfg), fields(id = %id))
)]
pub fn clean_by_id(
    store: &DatasetStore,
    id: &DatasetId,
    cfg: &CleanConfig,
) -> Result<CleanReceipt, CandelaError> {
    let snapshot = store
        .get(id)
        .ok_or_else(|| CandelaError::unknown_reference(id.to_string()))?;
    let CleanOutcome {
        candles, report, ..
    } = match snapshot {
        Snapshot::Raw(rows) => clean_raw(rows, cfg)?,
        Snapshot::Clean(candles) => clean_candles(candles, cfg)?,
    };
    if !store.replace(id, Snapshot::Clean(candles)) {
        return Err(CandelaError::unknown_reference(id.to_string()));
    }
    Ok(CleanReceipt { id: *id, report })
}

/// Run both statistics analyses over the snapshot stored under `id`.
///
/// The snapshot must already have been repaired; the statistics engine is
/// specified against the cleaning engine's output. The cache is not mutated.
///
/// # Errors
/// Returns [`CandelaError::UnknownReference`] for an unknown or expired
/// reference, [`CandelaError::Validation`] for a snapshot that has not been
/// cleaned, and propagates every analysis failure.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "candela::mediator::analyze_by_id", skip(store, cfg), fields(id = %id))
)]
pub fn analyze_by_id(
    store: &DatasetStore,
    id: &DatasetId,
    cfg: &StatsConfig,
) -> Result<RegimeDiagnostics, CandelaError> {
    match store
        .get(id)
        .ok_or_else(|| CandelaError::unknown_reference(id.to_string()))?
    {
        Snapshot::Clean(candles) => stats::analyze(&candles, cfg),
        Snapshot::Raw(_) => Err(CandelaError::validation(format!(
            "dataset {id} has not been cleaned"
        ))),
    }
}
