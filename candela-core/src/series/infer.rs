//! Grid-step inference from observed timestamp deltas.

use chrono::TimeDelta;

use crate::types::Candle;

/// Estimate the grid step (in seconds) as the lower median of positive
/// adjacent timestamp deltas.
///
/// The lower median keeps the chosen step an actually observed cadence: a
/// series with a few long outage gaps still resolves to its base frequency.
/// The input order does not matter and duplicate timestamps are ignored.
/// Returns `None` if fewer than two distinct timestamps are present.
#[must_use]
pub fn estimate_step_seconds(candles: &[Candle]) -> Option<i64> {
    if candles.len() < 2 {
        return None;
    }
    let mut ts: Vec<_> = candles.iter().map(|c| c.ts).collect();
    ts.sort();

    let mut deltas: Vec<i64> = Vec::with_capacity(ts.len().saturating_sub(1));
    let mut last = ts[0];
    for &cur in ts.iter().skip(1) {
        let dt: TimeDelta = cur - last;
        if dt > TimeDelta::zero() {
            deltas.push(dt.num_seconds());
            last = cur;
        }
    }
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();

    // Lower median
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 1 {
        Some(deltas[mid])
    } else {
        Some(deltas[mid - 1])
    }
}
