//! Statistical regime diagnostics computed over a repaired series.
//!
//! Both sub-analyses work from the same log-return series
//! `r_t = ln(close_t / close_{t-1})`. Percentage- and ratio-scale outputs are
//! rounded for presentation stability; every metric is computed from
//! unrounded intermediates.

pub mod autocorr;
pub mod distribution;

use candela_types::{CandelaError, StatsConfig};
use serde::{Deserialize, Serialize};

use crate::types::Candle;
pub use autocorr::AutocorrelationStats;
pub use distribution::DistributionStats;

/// Combined short-window, long-window, and autocorrelation diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDiagnostics {
    /// Distribution statistics over the trailing short window.
    pub short_term: DistributionStats,
    /// Distribution statistics over the trailing long window.
    pub long_term: DistributionStats,
    /// Per-lag return autocorrelation over the full sample.
    pub autocorrelation: AutocorrelationStats,
}

/// Run both sub-analyses over a repaired series.
///
/// The series must come out of the cleaning engine: every row needs a
/// present, strictly positive close. A window larger than the available
/// return count uses all available observations and flags the record as
/// truncated; it never silently truncates.
///
/// # Errors
/// - [`CandelaError::InvalidArg`] for windows below 2, a lag count below 1,
///   or a non-positive annualization factor.
/// - [`CandelaError::Validation`] if any row lacks a usable close.
/// - [`CandelaError::Computation`] if fewer than two return observations
///   exist, or a window's returns have zero variance.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "candela::stats::analyze",
        skip(candles, cfg),
        fields(
            rows = candles.len(),
            short_window = cfg.short_window,
            long_window = cfg.long_window,
        ),
    )
)]
pub fn analyze(candles: &[Candle], cfg: &StatsConfig) -> Result<RegimeDiagnostics, CandelaError> {
    if cfg.short_window < 2 || cfg.long_window < 2 {
        return Err(CandelaError::invalid_arg(
            "analysis windows must be at least 2 return observations",
        ));
    }
    if cfg.max_lag < 1 {
        return Err(CandelaError::invalid_arg("max_lag must be at least 1"));
    }
    if !(cfg.periods_per_year.is_finite() && cfg.periods_per_year > 0.0) {
        return Err(CandelaError::invalid_arg(
            "periods_per_year must be a positive finite number",
        ));
    }

    let (closes, returns) = distribution::log_returns(candles)?;
    if returns.len() < 2 {
        return Err(CandelaError::computation(
            "need at least two return observations",
        ));
    }

    let short_term =
        distribution::window_stats(&closes, &returns, cfg.short_window, cfg.periods_per_year)?;
    let long_term =
        distribution::window_stats(&closes, &returns, cfg.long_window, cfg.periods_per_year)?;
    let autocorrelation = autocorr::autocorrelation(&returns, cfg.max_lag)?;

    Ok(RegimeDiagnostics {
        short_term,
        long_term,
        autocorrelation,
    })
}

/// Cosmetic rounding for presentation-stable output fields.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
