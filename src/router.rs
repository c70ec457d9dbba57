// Routes decoded feed lines to the race state or the side-channel logs

use log::{debug, warn};

use crate::{
    errors::TrackerError,
    feed::{self, Category, FeedMessage},
    race::RaceState,
    side_channel::{SideChannel, SideChannelLogger},
};

/// Owns the race state and forwards each feed line to its category handler.
pub struct MessageRouter {
    state: RaceState,
    side_channel: SideChannelLogger,
}

impl MessageRouter {
    pub fn new(side_channel: SideChannelLogger) -> Self {
        Self {
            state: RaceState::new(),
            side_channel,
        }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    /// Decode one raw line and apply it. Lines that cannot be decoded are
    /// logged and dropped; they never stop ingestion.
    pub fn decode_and_route(&mut self, raw_line: &str) {
        let message = match feed::decode_line(raw_line) {
            Ok(message) => message,
            Err(e @ TrackerError::MalformedLine { .. }) => {
                warn!("{}: {}", e, raw_line);
                return;
            }
            Err(e) => {
                warn!("Dropping feed line ({}): {}", e, raw_line);
                return;
            }
        };

        for e in self.route(&message) {
            warn!("{} update skipped a field: {}", message.category, e);
        }
    }

    /// Dispatch a decoded message, returning the per-field errors.
    pub fn route(&mut self, message: &FeedMessage) -> Vec<TrackerError> {
        let side_channel = match &message.category {
            Category::TimingData => {
                return self
                    .state
                    .apply_timing_data(&message.payload, message.timestamp);
            }
            Category::TimingAppData => {
                return self
                    .state
                    .apply_timing_app_data(&message.payload, message.timestamp);
            }
            Category::WeatherData => {
                return self
                    .state
                    .apply_weather_data(&message.payload, message.timestamp);
            }
            Category::RaceControlMessages => SideChannel::RaceControl,
            Category::TrackStatus => SideChannel::TrackStatus,
            Category::SessionData => SideChannel::SessionData,
            Category::SessionInfo => SideChannel::SessionInfo,
            Category::ExtrapolatedClock => SideChannel::ExtrapolatedClock,
            Category::Other(name) => {
                debug!("Ignoring feed category {}", name);
                return Vec::new();
            }
        };

        match self
            .side_channel
            .record(side_channel, &message.timestamp_text, &message.payload)
        {
            Ok(()) => Vec::new(),
            Err(e) => vec![e],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn router(dir: &TempDir) -> MessageRouter {
        MessageRouter::new(SideChannelLogger::new(dir.path().to_path_buf()))
    }

    #[test]
    fn test_timing_line_reaches_race_state() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route(
            "['TimingData', {'Lines': {'1': {'Position': '3'}}}, '2024-01-01T00:00:05Z']",
        );
        assert_eq!(router.state().laps()[&1][&0].position, Some(3));
    }

    #[test]
    fn test_race_control_goes_to_side_log() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route(
            r#"["RaceControlMessages", {"Messages": [{"Flag": "GREEN"}]}, "2024-01-01T00:00:00Z"]"#,
        );

        let contents = fs::read_to_string(dir.path().join("race_control.txt")).unwrap();
        assert_eq!(
            contents,
            "2024-01-01T00:00:00Z : {\"Messages\":[{\"Flag\":\"GREEN\"}]}\n"
        );
        assert_eq!(router.state(), &RaceState::new());
    }

    #[test]
    fn test_bad_lines_are_dropped() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route("not json at all");
        router.decode_and_route(r#"["WeatherData", {"AirTemp": "20"}, "not-a-time"]"#);
        router.decode_and_route(r#"["Heartbeat", {"Utc": "2024-01-01T00:00:00Z"}, "2024-01-01T00:00:00Z"]"#);

        assert_eq!(router.state(), &RaceState::new());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_route_reports_field_errors() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        let message = feed::decode_line(
            r#"["TimingData", {"Lines": {"1": {"Position": "first"}}}, "2024-01-01T00:00:00Z"]"#,
        )
        .unwrap();

        let errors = router.route(&message);
        assert!(matches!(
            errors.as_slice(),
            [TrackerError::InvalidField { field, .. }] if field == "Position"
        ));
    }

    #[test]
    fn test_session_data_goes_to_session_log() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route(
            "['SessionData', {'StatusSeries': {'3': {'SessionStatus': 'Started'}}}, '2024-01-01T00:00:00Z']",
        );

        let contents = fs::read_to_string(dir.path().join("session.txt")).unwrap();
        assert_eq!(
            contents,
            "2024-01-01T00:00:00Z : 3 : {\"SessionStatus\":\"Started\"}\n"
        );
    }

    #[test]
    fn test_session_info_goes_to_session_info_log() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route(
            "['SessionInfo', {'Name': 'Race', 'Type': 'Race'}, '2024-01-01T00:00:00Z']",
        );

        let contents = fs::read_to_string(dir.path().join("session_info.txt")).unwrap();
        assert_eq!(
            contents,
            "2024-01-01T00:00:00Z : {\"Name\":\"Race\",\"Type\":\"Race\"}\n"
        );
    }

    #[test]
    fn test_extrapolated_clock_goes_to_clock_log() {
        let dir = TempDir::new().unwrap();
        let mut router = router(&dir);
        router.decode_and_route(
            "['ExtrapolatedClock', {'Remaining': '01:59:58', 'Extrapolating': True}, '2024-01-01T00:00:00Z']",
        );
        router.decode_and_route(
            "['ExtrapolatedClock', {'Remaining': '01:58:58', 'Extrapolating': True}, '2024-01-01T00:01:00Z']",
        );

        let contents =
            fs::read_to_string(dir.path().join("extrapolated_clock.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-01-01T00:01:00Z : {\"Extrapolating\":true,\"Remaining\":\"01:58:58\"}",
                "2024-01-01T00:00:00Z : {\"Extrapolating\":true,\"Remaining\":\"01:59:58\"}",
            ]
        );
        assert_eq!(router.state(), &RaceState::new());
    }
}
