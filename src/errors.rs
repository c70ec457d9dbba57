// Error types for livetiming

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TrackerError {
    // Errors while parsing feed literals
    #[snafu(display("Unsupported time format: {literal}"))]
    FormatError { literal: String },
    #[snafu(display("Invalid value for {field}: {value}"))]
    InvalidField { field: String, value: String },

    // Errors while decoding feed lines
    #[snafu(display("Json parse error"))]
    MalformedLine { source: serde_json::Error },
    #[snafu(display("Malformed feed message: {reason}"))]
    MalformedMessage { reason: String },
    #[snafu(display("Invalid feed timestamp: {literal}"))]
    InvalidTimestamp {
        literal: String,
        source: chrono::ParseError,
    },
    #[snafu(display("Unexpected {category} payload"))]
    InvalidPayload {
        category: String,
        source: serde_json::Error,
    },
    #[snafu(display("Invalid driver number: {value}"))]
    InvalidDriverNumber { value: String },
    #[snafu(display("Invalid stint number: {value}"))]
    InvalidStintNumber { value: String },

    // Errors for the source log and side files
    #[snafu(display("Error reading source log {path}"))]
    SourceReadError { path: String, source: io::Error },
    #[snafu(display("Error writing side-channel log {path}"))]
    SideChannelWriteError { path: String, source: io::Error },
    #[snafu(display("Error writing heartbeat file"))]
    HeartbeatWriteError { source: io::Error },
    #[snafu(display("Could not create output directory {path}"))]
    OutputDirError { path: String, source: io::Error },

    // Errors for the renderers
    #[snafu(display("Error rendering {chart}: {reason}"))]
    RenderError { chart: String, reason: String },
    #[snafu(display("Render worker is no longer accepting snapshots"))]
    RenderQueueClosed,
    #[snafu(display("Error writing chart series file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
