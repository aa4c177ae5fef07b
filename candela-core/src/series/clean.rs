//! The cleaning engine: a fixed-order repair pipeline turning an irregular,
//! possibly malformed series into a gap-free, internally consistent one.

use std::collections::BTreeMap;

use candela_types::{CandelaError, CleanConfig, CleanReport, Frequency};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::series::infer::estimate_step_seconds;
use crate::types::{Candle, RawCandle};

/// Repaired series plus the corrections applied and the resolved grid step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanOutcome {
    /// Repaired rows on a complete, evenly spaced grid.
    pub candles: Vec<Candle>,
    /// Corrections applied, one entry per category (per row for OHLC
    /// relationship repairs). Empty for an already-clean input.
    pub report: CleanReport,
    /// Grid step the series was aligned to, in seconds.
    pub step_seconds: i64,
}

/// Normalize raw provider rows and run the full repair pipeline.
///
/// # Errors
/// Returns [`CandelaError::Validation`] for an empty dataset or an unparsable
/// timestamp, and propagates every failure of [`clean_candles`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "candela::series::clean_raw",
        skip(rows, cfg),
        fields(rows = rows.len()),
    )
)]
pub fn clean_raw(rows: Vec<RawCandle>, cfg: &CleanConfig) -> Result<CleanOutcome, CandelaError> {
    if rows.is_empty() {
        return Err(CandelaError::validation("dataset is empty"));
    }
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        candles.push(row.into_candle()?);
    }
    clean_candles(candles, cfg)
}

/// Run the repair pipeline over already-normalized rows.
///
/// Steps, in fixed order: sort, de-duplicate, resolve the grid step, reindex
/// onto the complete grid, scrub non-finite values, scrub non-positive OHLC,
/// repair OHLC relationships, scrub negative volume, and fill remaining gaps.
/// Each step appends to the report only if it changed something, so running
/// the pipeline on its own output yields identical rows and an empty report.
///
/// # Errors
/// - [`CandelaError::Validation`] if the dataset is empty.
/// - [`CandelaError::InvalidArg`] for a non-positive explicit grid step.
/// - [`CandelaError::Computation`] if the step cannot be inferred, or an OHLC
///   column has no observed value to fill from.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "candela::series::clean_candles",
        skip(candles, cfg),
        fields(rows = candles.len()),
    )
)]
pub fn clean_candles(
    mut candles: Vec<Candle>,
    cfg: &CleanConfig,
) -> Result<CleanOutcome, CandelaError> {
    if candles.is_empty() {
        return Err(CandelaError::validation("dataset is empty"));
    }
    let mut report = CleanReport::new();

    // Sort (stable, so the first occurrence of a duplicate stays first).
    if !candles.is_sorted_by_key(|c| c.ts) {
        candles.sort_by_key(|c| c.ts);
        report.push("Sorted rows by timestamp.");
    }

    // De-duplicate, keeping the first occurrence.
    let before = candles.len();
    candles.dedup_by_key(|c| c.ts);
    let removed = before - candles.len();
    if removed > 0 {
        report.push(format!("Removed {removed} duplicate timestamps."));
    }

    // Resolve the grid step before any scrubbing can distort the deltas.
    let step_seconds = match cfg.frequency {
        Frequency::Seconds(s) if s > 0 => s,
        Frequency::Seconds(s) => {
            return Err(CandelaError::invalid_arg(format!(
                "grid step must be positive, got {s}s"
            )));
        }
        Frequency::Auto => estimate_step_seconds(&candles).ok_or_else(|| {
            CandelaError::computation(
                "cannot infer a grid step from fewer than two distinct timestamps",
            )
        })?,
        _ => {
            return Err(CandelaError::invalid_arg("unsupported frequency variant"));
        }
    };

    // Reindex onto the complete grid from the earliest to the latest
    // timestamp. Grid points absent from the data become all-missing rows;
    // rows not landing on the grid are dropped.
    let (mut grid, inserted, off_grid) = reindex(candles, step_seconds);
    if inserted > 0 {
        report.push(format!(
            "Found {inserted} missing timestamps; reindexed to a complete timeline."
        ));
    }
    if off_grid > 0 {
        report.push(format!(
            "Dropped {off_grid} rows off the {step_seconds}s grid."
        ));
    }

    // Non-finite values become missing.
    let non_finite = scrub(&mut grid, |_| true, |v| !v.is_finite());
    if non_finite > 0 {
        report.push(format!(
            "Replaced {non_finite} non-finite values with missing."
        ));
    }

    // Zero or negative prices become missing, counted per column.
    for (name, field) in [
        ("open", FieldMut::Open),
        ("high", FieldMut::High),
        ("low", FieldMut::Low),
        ("close", FieldMut::Close),
    ] {
        let bad = scrub(&mut grid, |f| *f == field, |v| v <= 0.0);
        if bad > 0 {
            report.push(format!(
                "Column '{name}' had {bad} zero/negative values; set to missing."
            ));
        }
    }

    // Reorder and clamp contradictory OHLC values. Rows with any missing
    // OHLC field are left untouched; repair never fabricates a value.
    if cfg.repair_ohlc {
        for c in &mut grid {
            if let (Some(o), Some(h), Some(l), Some(cl)) = (c.open, c.high, c.low, c.close) {
                let low = l.min(h);
                let high = l.max(h);
                let open = o.clamp(low, high);
                let close = cl.clamp(low, high);
                if low != l || high != h || open != o || close != cl {
                    c.low = Some(low);
                    c.high = Some(high);
                    c.open = Some(open);
                    c.close = Some(close);
                    report.push(format!("Repaired inconsistent OHLC at {}.", c.ts));
                }
            }
        }
    }

    // Negative volume becomes missing.
    let neg_volume = scrub(&mut grid, |f| *f == FieldMut::Volume, |v| v < 0.0);
    if neg_volume > 0 {
        report.push(format!(
            "Volume had {neg_volume} negative values; set to missing."
        ));
    }

    // Fill every remaining gap: time-weighted interpolation between the
    // nearest present neighbours, then forward fill, then backward fill at
    // the boundaries. An entirely absent volume column stays absent; the
    // series simply carries no volume.
    let mut filled = 0;
    filled += fill_column(&mut grid, "open", true, |c| &mut c.open)?;
    filled += fill_column(&mut grid, "high", true, |c| &mut c.high)?;
    filled += fill_column(&mut grid, "low", true, |c| &mut c.low)?;
    filled += fill_column(&mut grid, "close", true, |c| &mut c.close)?;
    filled += fill_column(&mut grid, "volume", false, |c| &mut c.volume)?;
    if filled > 0 {
        report.push(format!(
            "Filled {filled} missing values (time interpolation, forward fill, backward fill)."
        ));
    }

    Ok(CleanOutcome {
        candles: grid,
        report,
        step_seconds,
    })
}

/// Field selector for [`scrub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldMut {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl FieldMut {
    fn get<'c>(self, c: &'c mut Candle) -> &'c mut Option<f64> {
        match self {
            Self::Open => &mut c.open,
            Self::High => &mut c.high,
            Self::Low => &mut c.low,
            Self::Close => &mut c.close,
            Self::Volume => &mut c.volume,
        }
    }
}

/// Set matching fields to missing wherever `bad` holds; returns the count.
fn scrub(
    candles: &mut [Candle],
    select: impl Fn(&FieldMut) -> bool,
    bad: impl Fn(f64) -> bool,
) -> usize {
    let mut count = 0;
    for c in candles {
        for field in [
            FieldMut::Open,
            FieldMut::High,
            FieldMut::Low,
            FieldMut::Close,
            FieldMut::Volume,
        ] {
            if !select(&field) {
                continue;
            }
            let slot = field.get(c);
            if let Some(v) = *slot
                && bad(v)
            {
                *slot = None;
                count += 1;
            }
        }
    }
    count
}

/// Align rows onto the evenly spaced grid spanning the series.
///
/// Returns the grid, the number of all-missing rows inserted for gaps, and
/// the number of rows dropped because they do not land on a grid point.
fn reindex(candles: Vec<Candle>, step_seconds: i64) -> (Vec<Candle>, usize, usize) {
    let first = candles[0].ts;
    let last = candles[candles.len() - 1].ts;
    let step = TimeDelta::seconds(step_seconds);

    let mut by_ts: BTreeMap<DateTime<Utc>, Candle> = candles.into_iter().map(|c| (c.ts, c)).collect();
    let mut grid = Vec::new();
    let mut inserted = 0;
    let mut t = first;
    while t <= last {
        match by_ts.remove(&t) {
            Some(c) => grid.push(c),
            None => {
                inserted += 1;
                grid.push(Candle::missing(t));
            }
        }
        t += step;
    }
    let off_grid = by_ts.len();
    (grid, inserted, off_grid)
}

/// Fill one column's gaps; returns the number of values filled.
///
/// Interior gaps are filled by time-weighted linear interpolation between the
/// nearest present neighbours; boundary gaps take the nearest value forward,
/// then backward. A `required` column with no observed value at all is a
/// terminal computation failure; an optional one is left absent.
fn fill_column<F>(
    candles: &mut [Candle],
    name: &str,
    required: bool,
    mut field: F,
) -> Result<usize, CandelaError>
where
    F: FnMut(&mut Candle) -> &mut Option<f64>,
{
    let n = candles.len();
    let values: Vec<Option<f64>> = candles.iter_mut().map(|c| *field(c)).collect();

    if values.iter().all(Option::is_none) {
        if required {
            return Err(CandelaError::computation(format!(
                "column '{name}' has no observed values to fill from"
            )));
        }
        return Ok(0);
    }

    // Nearest present neighbour on each side of every position.
    let mut prev: Vec<Option<(usize, f64)>> = vec![None; n];
    let mut seen = None;
    for (i, v) in values.iter().enumerate() {
        if let Some(v) = v {
            seen = Some((i, *v));
        }
        prev[i] = seen;
    }
    let mut next: Vec<Option<(usize, f64)>> = vec![None; n];
    seen = None;
    for (i, v) in values.iter().enumerate().rev() {
        if let Some(v) = v {
            seen = Some((i, *v));
        }
        next[i] = seen;
    }

    let mut filled = 0;
    for i in 0..n {
        if values[i].is_some() {
            continue;
        }
        let v = match (prev[i], next[i]) {
            (Some((p, vp)), Some((q, vq))) => {
                let span = (candles[q].ts - candles[p].ts).num_seconds();
                let elapsed = (candles[i].ts - candles[p].ts).num_seconds();
                // span > 0 since p < i < q on a strictly increasing grid
                let w = to_f64(elapsed) / to_f64(span);
                vp + (vq - vp) * w
            }
            (Some((_, vp)), None) => vp,
            (None, Some((_, vq))) => vq,
            (None, None) => continue,
        };
        *field(&mut candles[i]) = Some(v);
        filled += 1;
    }
    Ok(filled)
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(v: i64) -> f64 {
    v as f64
}
