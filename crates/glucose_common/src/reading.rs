//! Glucose reading model
//!
//! A reading is one Nightscout entry as returned by `/api/v1/entries.json`.
//! Only the fields the speech pipeline needs are kept: `sgv`, `date`,
//! `dateString` and `direction`. Once parsed a reading is never mutated.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest epoch offset a timestamp may carry (the ECMAScript Date range)
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Trend arrow reported alongside a reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendDirection {
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    NotComputable,
    RateOutOfRange,
    /// Any tag outside the known vocabulary, kept verbatim
    Other(String),
}

impl TrendDirection {
    /// Parse a wire tag. Empty tags count as "no direction".
    pub fn from_tag(tag: &str) -> Option<Self> {
        let direction = match tag {
            "" => return None,
            "DoubleUp" => Self::DoubleUp,
            "SingleUp" => Self::SingleUp,
            "FortyFiveUp" => Self::FortyFiveUp,
            "Flat" => Self::Flat,
            "FortyFiveDown" => Self::FortyFiveDown,
            "SingleDown" => Self::SingleDown,
            "DoubleDown" => Self::DoubleDown,
            "NOT COMPUTABLE" => Self::NotComputable,
            "RATE_OUT_OF_RANGE" => Self::RateOutOfRange,
            other => Self::Other(other.to_string()),
        };
        Some(direction)
    }

    /// Wire tag as Nightscout spells it
    pub fn as_tag(&self) -> &str {
        match self {
            Self::DoubleUp => "DoubleUp",
            Self::SingleUp => "SingleUp",
            Self::FortyFiveUp => "FortyFiveUp",
            Self::Flat => "Flat",
            Self::FortyFiveDown => "FortyFiveDown",
            Self::SingleDown => "SingleDown",
            Self::DoubleDown => "DoubleDown",
            Self::NotComputable => "NOT COMPUTABLE",
            Self::RateOutOfRange => "RATE_OUT_OF_RANGE",
            Self::Other(tag) => tag,
        }
    }
}

/// Errors turning an entry object into a reading
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadingError {
    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Entry has no numeric sgv value")]
    MissingValue,
}

/// Entry exactly as it arrives on the wire.
///
/// Only `sgv` is strictly typed; optional fields of the wrong type are
/// treated as absent.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    sgv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_date")]
    date: Option<RawDate>,
    #[serde(default, rename = "dateString", deserialize_with = "lenient_string")]
    date_string: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    direction: Option<String>,
}

/// `date` is usually epoch milliseconds, but some uploaders send ISO text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(f64),
    Text(String),
}

fn lenient_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RawDate>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl RawDate {
    /// Epoch milliseconds, or `None` for zero, out-of-range or unparsable dates
    fn to_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(d) if d.is_finite() && *d != 0.0 && d.abs() <= MAX_EPOCH_MILLIS => {
                Some(*d as i64)
            }
            Self::Millis(_) => None,
            Self::Text(s) => parse_date_string(s),
        }
    }
}

/// One blood-glucose measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseReading {
    #[serde(rename = "sgv")]
    value: f64,
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    date_millis: Option<i64>,
    #[serde(rename = "dateString", skip_serializing_if = "Option::is_none")]
    date_string: Option<String>,
    #[serde(
        rename = "direction",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_direction"
    )]
    direction: Option<TrendDirection>,
}

fn serialize_direction<S: Serializer>(
    direction: &Option<TrendDirection>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match direction {
        Some(d) => serializer.serialize_str(d.as_tag()),
        None => serializer.serialize_none(),
    }
}

impl GlucoseReading {
    /// Build a reading from one element of the entries array
    pub fn from_entry(entry: &serde_json::Value) -> Result<Self, ReadingError> {
        let raw: RawEntry = serde_json::from_value(entry.clone())
            .map_err(|e| ReadingError::Malformed(e.to_string()))?;

        let value = raw.sgv.ok_or(ReadingError::MissingValue)?;

        Ok(Self {
            value,
            date_millis: raw.date.as_ref().and_then(RawDate::to_millis),
            date_string: raw.date_string.filter(|s| !s.is_empty()),
            direction: raw.direction.as_deref().and_then(TrendDirection::from_tag),
        })
    }

    /// Concentration in mg/dL
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> Option<&TrendDirection> {
        self.direction.as_ref()
    }

    pub fn date_string(&self) -> Option<&str> {
        self.date_string.as_deref()
    }

    /// When the reading was taken, in epoch milliseconds.
    ///
    /// Prefers the numeric `date` field and falls back to parsing
    /// `dateString`. Returns `None` when neither yields a time.
    pub fn effective_timestamp(&self) -> Option<i64> {
        if let Some(millis) = self.date_millis {
            return Some(millis);
        }
        self.date_string.as_deref().and_then(parse_date_string)
    }
}

/// Parse an ISO-8601 date; strings without an offset are taken as UTC
fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
