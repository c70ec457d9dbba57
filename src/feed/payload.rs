// Permissive payload shapes for the feed categories the race state models.
//
// The feed adds and drops fields from message to message, so every field is
// optional and every scalar is decoded as a `FeedValue` that accepts whatever
// JSON type the feed happened to use.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::TrackerError;

/// A scalar as it appears on the wire: numbers sometimes arrive as strings and
/// flags sometimes arrive as `"true"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedValue {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Nested(Value),
}

impl FeedValue {
    /// Text form of the value. Objects carrying a `Value` key (the feed's
    /// wrapper for most timing fields) are unwrapped.
    pub fn text(&self) -> Option<String> {
        match self {
            FeedValue::Text(s) => Some(s.clone()),
            FeedValue::Int(i) => Some(i.to_string()),
            FeedValue::Float(f) => Some(f.to_string()),
            FeedValue::Flag(b) => Some(b.to_string()),
            FeedValue::Nested(Value::Object(map)) => map
                .get("Value")
                .and_then(|v| serde_json::from_value::<FeedValue>(v.clone()).ok())
                .and_then(|v| v.text()),
            FeedValue::Nested(_) => None,
        }
    }

    pub fn as_u32(&self, field: &str) -> Result<u32, TrackerError> {
        let invalid = || TrackerError::InvalidField {
            field: field.to_string(),
            value: self.describe(),
        };
        match self {
            FeedValue::Int(i) => u32::try_from(*i).map_err(|_| invalid()),
            FeedValue::Text(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    pub fn as_f64(&self, field: &str) -> Result<f64, TrackerError> {
        let invalid = || TrackerError::InvalidField {
            field: field.to_string(),
            value: self.describe(),
        };
        match self {
            FeedValue::Int(i) => Ok(*i as f64),
            FeedValue::Float(f) => Ok(*f),
            FeedValue::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    pub fn as_bool(&self, field: &str) -> Result<bool, TrackerError> {
        match self {
            FeedValue::Flag(b) => Ok(*b),
            FeedValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            FeedValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(TrackerError::InvalidField {
                field: field.to_string(),
                value: self.describe(),
            }),
        }
    }

    /// True for an empty text literal, which the feed uses for "no value".
    pub fn is_blank(&self) -> bool {
        matches!(self, FeedValue::Text(s) if s.trim().is_empty())
    }

    fn describe(&self) -> String {
        match self {
            FeedValue::Nested(v) => v.to_string(),
            other => other.text().unwrap_or_default(),
        }
    }
}

/// `TimingData` payload: per-driver timing lines keyed by car number.
///
/// Lines are kept as raw JSON so that one malformed driver entry does not
/// take the rest of the payload down with it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimingDataPayload {
    pub lines: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimingLine {
    pub last_lap_time: Option<FeedValue>,
    pub number_of_laps: Option<FeedValue>,
    pub position: Option<FeedValue>,
    pub gap_to_leader: Option<FeedValue>,
    pub interval_to_position_ahead: Option<FeedValue>,
}

/// `TimingAppData` payload: per-driver tyre information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimingAppDataPayload {
    pub lines: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimingAppLine {
    pub stints: Option<StintsField>,
}

/// The feed sends stints either keyed by stint number or, when a fresh stint
/// starts, as a bare list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StintsField {
    Keyed(BTreeMap<String, Value>),
    Listed(Vec<Value>),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StintEntry {
    pub lap_time: Option<FeedValue>,
    pub lap_number: Option<FeedValue>,
    pub compound: Option<FeedValue>,
    pub new: Option<FeedValue>,
    pub total_laps: Option<FeedValue>,
    pub start_laps: Option<FeedValue>,
}

/// `WeatherData` payload. Values arrive as numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WeatherPayload {
    pub air_temp: Option<FeedValue>,
    pub track_temp: Option<FeedValue>,
    pub wind_speed: Option<FeedValue>,
    pub rainfall: Option<FeedValue>,
}
