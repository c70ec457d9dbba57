// Parsing of the feed's duration literals

use crate::errors::TrackerError;

/// Convert a feed duration literal to seconds.
///
/// Accepted shapes are `SS.sss`, `MM:SS.sss` and `H:MM:SS.sss`. The empty
/// string is the feed's way of saying "no value" and maps to `0`.
pub fn parse_duration(literal: &str) -> Result<f64, TrackerError> {
    if literal.is_empty() {
        return Ok(0.);
    }

    let format_error = || TrackerError::FormatError {
        literal: literal.to_string(),
    };
    let parts: Vec<&str> = literal.split(':').collect();

    match parts.as_slice() {
        [seconds] => seconds.trim().parse::<f64>().map_err(|_| format_error()),
        [minutes, seconds] => {
            let minutes = minutes.trim().parse::<u32>().map_err(|_| format_error())?;
            let seconds = seconds.trim().parse::<f64>().map_err(|_| format_error())?;
            Ok(f64::from(minutes) * 60. + seconds)
        }
        [hours, minutes, seconds] => {
            let hours = hours.trim().parse::<u32>().map_err(|_| format_error())?;
            let minutes = minutes.trim().parse::<u32>().map_err(|_| format_error())?;
            let seconds = seconds.trim().parse::<f64>().map_err(|_| format_error())?;
            Ok(f64::from(hours) * 3600. + f64::from(minutes) * 60. + seconds)
        }
        _ => Err(format_error()),
    }
}

/// Parse a signed gap literal such as `+1.234` or `+1:02.345`.
pub fn parse_gap(literal: &str) -> Result<f64, TrackerError> {
    parse_duration(literal.trim().trim_start_matches('+'))
}
