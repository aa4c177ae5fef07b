//! Return autocorrelation with a white-noise significance band.

use candela_types::CandelaError;
use serde::{Deserialize, Serialize};

use crate::stats::round_to;

/// Autocorrelation of the return series at a single lag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagCorrelation {
    /// Lag, in return observations.
    pub lag: usize,
    /// Lag-k autocovariance over the full-sample variance, clamped to
    /// `[-1, 1]`.
    pub correlation: f64,
    /// True when the unrounded correlation magnitude exceeds the white-noise
    /// confidence band.
    pub significant: bool,
}

/// Per-lag return autocorrelation plus an approximate 95% confidence band
/// under a white-noise null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationStats {
    /// Number of return observations the correlations were estimated from.
    pub observations: usize,
    /// White-noise 95% band: `1.96 / sqrt(observations)`.
    pub confidence_band: f64,
    /// Correlations at lags `1..=max_lag`, capped at `observations - 1`.
    pub lags: Vec<LagCorrelation>,
}

/// Estimate lag-k autocorrelations over the full return sample.
///
/// Each lag's autocovariance is taken about the full-sample mean and divided
/// by the full-sample variance, so the estimates are mutually comparable and
/// consistent with the distribution analysis's return definition.
pub(crate) fn autocorrelation(
    returns: &[f64],
    max_lag: usize,
) -> Result<AutocorrelationStats, CandelaError> {
    let observations = returns.len();
    let n = to_f64(observations);
    let mean = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();
    if variance == 0.0 {
        return Err(CandelaError::computation(
            "return series has zero variance",
        ));
    }

    let band = 1.96 / n.sqrt();
    let mut lags = Vec::with_capacity(max_lag.min(observations - 1));
    for lag in 1..=max_lag.min(observations - 1) {
        let covariance: f64 = (lag..observations)
            .map(|i| (returns[i] - mean) * (returns[i - lag] - mean))
            .sum();
        let correlation = (covariance / variance).clamp(-1.0, 1.0);
        lags.push(LagCorrelation {
            lag,
            correlation: round_to(correlation, 4),
            significant: correlation.abs() > band,
        });
    }

    Ok(AutocorrelationStats {
        observations,
        confidence_band: round_to(band, 4),
        lags,
    })
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(v: usize) -> f64 {
    v as f64
}
