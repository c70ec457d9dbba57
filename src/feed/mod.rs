// Decoding of raw live-timing feed lines

pub mod duration;
pub mod payload;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::errors::TrackerError;

pub use duration::{parse_duration, parse_gap};
pub use payload::{
    FeedValue, StintEntry, StintsField, TimingAppDataPayload, TimingAppLine, TimingDataPayload,
    TimingLine, WeatherPayload,
};

/// Feed categories the tracker knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    TimingData,
    TimingAppData,
    WeatherData,
    RaceControlMessages,
    TrackStatus,
    SessionData,
    SessionInfo,
    ExtrapolatedClock,
    Other(String),
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "TimingData" => Category::TimingData,
            "TimingAppData" => Category::TimingAppData,
            "WeatherData" => Category::WeatherData,
            "RaceControlMessages" => Category::RaceControlMessages,
            "TrackStatus" => Category::TrackStatus,
            "SessionData" => Category::SessionData,
            "SessionInfo" => Category::SessionInfo,
            "ExtrapolatedClock" => Category::ExtrapolatedClock,
            other => Category::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::TimingData => write!(f, "TimingData"),
            Category::TimingAppData => write!(f, "TimingAppData"),
            Category::WeatherData => write!(f, "WeatherData"),
            Category::RaceControlMessages => write!(f, "RaceControlMessages"),
            Category::TrackStatus => write!(f, "TrackStatus"),
            Category::SessionData => write!(f, "SessionData"),
            Category::SessionInfo => write!(f, "SessionInfo"),
            Category::ExtrapolatedClock => write!(f, "ExtrapolatedClock"),
            Category::Other(name) => write!(f, "{name}"),
        }
    }
}

/// One decoded feed line: `[category, payload, timestamp, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMessage {
    pub category: Category,
    pub payload: Value,
    /// Timestamp text exactly as the feed wrote it, used by the side-channel logs
    pub timestamp_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Coerce a stringified object dump into JSON text by swapping single quotes
/// for double quotes and `True`/`False` for `true`/`false`.
///
/// This is a textual substitution: an apostrophe inside a string value will
/// still produce invalid JSON, which the decoder then reports.
pub fn normalize_to_json(raw_line: &str) -> String {
    raw_line
        .replace('\'', "\"")
        .replace("True", "true")
        .replace("False", "false")
}

/// Parse an ISO-8601 feed timestamp. A trailing `Z` means UTC; timestamps
/// without an offset are taken as UTC.
pub fn parse_timestamp(literal: &str) -> Result<DateTime<Utc>, TrackerError> {
    let trimmed = literal.trim();
    let normalized = match trimmed.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => trimmed.to_string(),
    };

    match DateTime::parse_from_rfc3339(&normalized) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| TrackerError::InvalidTimestamp {
                literal: literal.to_string(),
                source: rfc_err,
            }),
    }
}

/// Decode one raw feed line into a [`FeedMessage`].
pub fn decode_line(raw_line: &str) -> Result<FeedMessage, TrackerError> {
    let json_text = normalize_to_json(raw_line);
    let fields: Vec<Value> = serde_json::from_str(&json_text)
        .map_err(|e| TrackerError::MalformedLine { source: e })?;

    let mut fields = fields.into_iter();
    let category = match fields.next() {
        Some(Value::String(category)) => Category::from(category.as_str()),
        _ => {
            return Err(TrackerError::MalformedMessage {
                reason: "first element must be the category name".to_string(),
            });
        }
    };
    let payload = fields.next().ok_or_else(|| TrackerError::MalformedMessage {
        reason: format!("{category} message has no payload"),
    })?;
    let timestamp_text = match fields.next() {
        Some(Value::String(ts)) => ts,
        _ => {
            return Err(TrackerError::MalformedMessage {
                reason: format!("{category} message has no timestamp"),
            });
        }
    };
    let timestamp = parse_timestamp(&timestamp_text)?;

    Ok(FeedMessage {
        category,
        payload,
        timestamp_text,
        timestamp,
    })
}
