//! Return-distribution diagnostics over trailing windows.

use candela_types::CandelaError;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::stats::round_to;
use crate::types::Candle;

/// Distribution statistics for one trailing window of return observations.
///
/// Kurtosis is reported as excess kurtosis (Fisher convention): 0 is the
/// normal baseline and positive values indicate fat tails. Mean return,
/// volatility, extreme-move frequencies, and drawdown are percentages;
/// rounding is cosmetic and never feeds back into other metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Requested window length, in return observations.
    pub window: usize,
    /// Observations actually used; smaller than `window` when truncated.
    pub observations: usize,
    /// True when fewer observations were available than requested.
    pub truncated: bool,
    /// Mean return over the window, in percent.
    pub mean_return_pct: f64,
    /// Sample standard deviation of returns scaled by the square root of the
    /// periods per year, in percent.
    pub annualized_volatility_pct: f64,
    /// Third standardized moment of the window's returns.
    pub skewness: f64,
    /// Fourth standardized moment minus 3 (normal baseline 0).
    pub kurtosis_excess: f64,
    /// Share of returns above twice the window standard deviation, in percent.
    pub extreme_up_moves_pct: f64,
    /// Share of returns below minus twice the window standard deviation, in
    /// percent.
    pub extreme_down_moves_pct: f64,
    /// Peak-to-trough decline over the window's closes, in percent.
    pub max_drawdown_pct: f64,
    /// Jarque-Bera p-value for the window's returns.
    pub normality_p_value: f64,
}

/// Closes and log returns of a repaired series.
///
/// The first, undefined return is dropped: `returns.len() == closes.len() - 1`.
///
/// # Errors
/// Returns [`CandelaError::Validation`] if any row lacks a present, strictly
/// positive, finite close; the statistics engine consumes cleaned datasets
/// only.
pub(crate) fn log_returns(candles: &[Candle]) -> Result<(Vec<f64>, Vec<f64>), CandelaError> {
    let mut closes = Vec::with_capacity(candles.len());
    for c in candles {
        match c.close {
            Some(v) if v > 0.0 && v.is_finite() => closes.push(v),
            _ => {
                return Err(CandelaError::validation(format!(
                    "row at {} has no usable close; run the cleaning engine first",
                    c.ts
                )));
            }
        }
    }
    let returns = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    Ok((closes, returns))
}

/// Distribution statistics over the trailing `window` returns (and the
/// trailing `window + 1` closes for the drawdown).
pub(crate) fn window_stats(
    closes: &[f64],
    returns: &[f64],
    window: usize,
    periods_per_year: f64,
) -> Result<DistributionStats, CandelaError> {
    let observations = returns.len().min(window);
    let truncated = window > returns.len();
    let tail = &returns[returns.len() - observations..];
    let prices = &closes[closes.len() - (observations + 1)..];
    let n = to_f64(observations);

    let mean = tail.iter().sum::<f64>() / n;
    let sum_sq: f64 = tail.iter().map(|r| (r - mean).powi(2)).sum();
    if sum_sq == 0.0 {
        return Err(CandelaError::computation(format!(
            "window of {observations} returns has zero variance"
        )));
    }
    // Sample standard deviation for the volatility and the extreme-move
    // threshold; population moments for the shape statistics.
    let std_sample = (sum_sq / (n - 1.0)).sqrt();
    let m2 = sum_sq / n;
    let m3 = tail.iter().map(|r| (r - mean).powi(3)).sum::<f64>() / n;
    let m4 = tail.iter().map(|r| (r - mean).powi(4)).sum::<f64>() / n;
    let skewness = m3 / m2.powf(1.5);
    let kurtosis_excess = m4 / (m2 * m2) - 3.0;

    let threshold = 2.0 * std_sample;
    let up = tail.iter().filter(|&&r| r > threshold).count();
    let down = tail.iter().filter(|&&r| r < -threshold).count();

    let max_drawdown = max_drawdown(prices);

    let jarque_bera = n / 6.0 * (skewness * skewness + kurtosis_excess * kurtosis_excess / 4.0);
    let chi2 = ChiSquared::new(2.0)
        .map_err(|e| CandelaError::computation(format!("chi-squared distribution: {e}")))?;
    let p_value = 1.0 - chi2.cdf(jarque_bera);

    Ok(DistributionStats {
        window,
        observations,
        truncated,
        mean_return_pct: round_to(mean * 100.0, 4),
        annualized_volatility_pct: round_to(std_sample * periods_per_year.sqrt() * 100.0, 4),
        skewness: round_to(skewness, 4),
        kurtosis_excess: round_to(kurtosis_excess, 4),
        extreme_up_moves_pct: round_to(to_f64(up) / n * 100.0, 2),
        extreme_down_moves_pct: round_to(to_f64(down) / n * 100.0, 2),
        max_drawdown_pct: round_to(max_drawdown * 100.0, 2),
        normality_p_value: round_to(p_value, 4),
    })
}

/// Peak-to-trough decline relative to the running maximum: `1 - min(p / peak)`.
fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 1.0f64;
    for &p in prices {
        if p > peak {
            peak = p;
        }
        worst = worst.min(p / peak);
    }
    1.0 - worst
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(v: usize) -> f64 {
    v as f64
}
