//! Row types crossing the ingestion and engine boundaries.

use candela_types::CandelaError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Externally-sourced OHLCV row, prior to timestamp normalization.
///
/// The timestamp is kept exactly as the provider sent it; upstream feeds
/// spell the field `datetime` (intraday) or `date` (daily), both accepted on
/// deserialization. Extra fields in the input record are ignored rather than
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    /// Provider timestamp, unparsed.
    #[serde(alias = "datetime", alias = "date")]
    pub ts: String,
    /// Opening price, if the provider sent one.
    pub open: Option<f64>,
    /// Highest traded price, if the provider sent one.
    pub high: Option<f64>,
    /// Lowest traded price, if the provider sent one.
    pub low: Option<f64>,
    /// Closing price, if the provider sent one.
    pub close: Option<f64>,
    /// Traded volume, if the provider sent one.
    pub volume: Option<f64>,
}

impl RawCandle {
    /// Normalize the provider timestamp into a canonical [`Candle`].
    ///
    /// # Errors
    /// Returns [`CandelaError::Validation`] if the timestamp is empty or does
    /// not parse as any accepted format.
    pub fn into_candle(self) -> Result<Candle, CandelaError> {
        let ts = parse_timestamp(&self.ts)?;
        Ok(Candle {
            ts,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Canonical row: a UTC timestamp plus tri-state OHLCV fields.
///
/// `None` means the field is absent, either a grid gap or a scrubbed value;
/// no sentinel numeric is used anywhere. After a successful cleaning pass
/// every OHLC field is `Some` and strictly positive, and `volume` is `Some`
/// whenever the series carries any volume at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Row timestamp.
    pub ts: DateTime<Utc>,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest traded price.
    pub high: Option<f64>,
    /// Lowest traded price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<f64>,
}

impl Candle {
    /// Row with every field absent, as inserted for grid gaps.
    #[must_use]
    pub const fn missing(ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }
}

/// Parse a provider timestamp into UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, and integer epoch
/// seconds, the formats the upstream feeds emit. Naive timestamps are taken
/// as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CandelaError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(CandelaError::validation("row is missing its timestamp"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(secs) = s.parse::<i64>()
        && let Some(dt) = DateTime::from_timestamp(secs, 0)
    {
        return Ok(dt);
    }
    Err(CandelaError::validation(format!(
        "unparsable timestamp '{raw}'"
    )))
}
