// Human-readable logs for the feed categories that are not folded into race state

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde_json::Value;

use crate::errors::TrackerError;

/// Feed categories that are only logged, each to its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideChannel {
    RaceControl,
    TrackStatus,
    SessionData,
    SessionInfo,
    ExtrapolatedClock,
}

impl SideChannel {
    pub const ALL: [SideChannel; 5] = [
        SideChannel::RaceControl,
        SideChannel::TrackStatus,
        SideChannel::SessionData,
        SideChannel::SessionInfo,
        SideChannel::ExtrapolatedClock,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            SideChannel::RaceControl => "race_control.txt",
            SideChannel::TrackStatus => "track_status.txt",
            SideChannel::SessionData => "session.txt",
            SideChannel::SessionInfo => "session_info.txt",
            SideChannel::ExtrapolatedClock => "extrapolated_clock.txt",
        }
    }
}

/// Prepend `message` as a new first line of the file, creating it if needed.
///
/// Rewrites the whole file on every call, so cost grows with file size.
pub fn append_top(path: &Path, message: &str) -> Result<(), TrackerError> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(TrackerError::SideChannelWriteError {
                path: path.display().to_string(),
                source: e,
            });
        }
    };
    fs::write(path, format!("{message}\n{existing}")).map_err(|e| {
        TrackerError::SideChannelWriteError {
            path: path.display().to_string(),
            source: e,
        }
    })
}

/// Delete a file, treating "not found" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn join_with_colon(parts: &[&str]) -> String {
    parts.join(" : ")
}

/// Payloads are logged as compact JSON, strings without their quotes.
fn describe(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Writes side-channel messages into `<logs_dir>/<channel file>`, newest first.
pub struct SideChannelLogger {
    logs_dir: PathBuf,
}

impl SideChannelLogger {
    pub fn new(logs_dir: PathBuf) -> Self {
        Self { logs_dir }
    }

    pub fn path(&self, channel: SideChannel) -> PathBuf {
        self.logs_dir.join(channel.file_name())
    }

    /// Best-effort removal of every side-channel file from a previous run.
    pub fn clear(&self) {
        for channel in SideChannel::ALL {
            let path = self.path(channel);
            if let Err(e) = remove_if_exists(&path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }

    /// Log one message as `<timestamp> : <payload>`.
    pub fn record(
        &self,
        channel: SideChannel,
        timestamp_text: &str,
        payload: &Value,
    ) -> Result<(), TrackerError> {
        if channel == SideChannel::SessionData {
            return self.record_session_data(timestamp_text, payload);
        }
        let message = join_with_colon(&[timestamp_text, &describe(payload)]);
        append_top(&self.path(channel), &message)
    }

    /// Session data is logged one `StatusSeries` entry per line.
    fn record_session_data(&self, timestamp_text: &str, payload: &Value) -> Result<(), TrackerError> {
        let path = self.path(SideChannel::SessionData);
        match payload.get("StatusSeries") {
            Some(Value::Object(series)) => {
                for (no, value) in series {
                    let message = join_with_colon(&[timestamp_text, no, &describe(value)]);
                    append_top(&path, &message)?;
                }
                Ok(())
            }
            Some(list @ Value::Array(_)) => {
                warn!("session data is a list {}", list);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
