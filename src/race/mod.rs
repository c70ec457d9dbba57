// Running race state folded from the live-timing feed

pub mod lap;
pub mod stint;
pub mod weather;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TrackerError;
use crate::feed::{
    FeedValue, StintEntry, StintsField, TimingAppDataPayload, TimingAppLine, TimingDataPayload,
    TimingLine, WeatherPayload, parse_duration, parse_gap,
};

pub use lap::Lap;
pub use stint::{Compound, Stint};
pub use weather::{WeatherField, WeatherSample};

/// Laps of every driver: driver number -> lap number -> lap
pub type LapMap = BTreeMap<u32, BTreeMap<u32, Lap>>;
/// Stints of every driver: driver number -> stint number -> stint
pub type StintMap = BTreeMap<u32, BTreeMap<u32, Stint>>;
/// Weather samples keyed by feed timestamp
pub type WeatherMap = BTreeMap<DateTime<Utc>, WeatherSample>;

/// Immutable copy of the race state handed to renderers between cycles.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RaceSnapshot {
    pub laps: LapMap,
    pub stints: StintMap,
    pub weather: WeatherMap,
}

/// The mutable race aggregate. Owned by the polling loop, which is its only
/// writer; renderers only ever see [`RaceSnapshot`]s.
///
/// Every `apply_*` method applies as much of the payload as it can and returns
/// the errors for the fields it had to skip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RaceState {
    laps: LapMap,
    stints: StintMap,
    weather: WeatherMap,
}

impl RaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn laps(&self) -> &LapMap {
        &self.laps
    }

    pub fn stints(&self) -> &StintMap {
        &self.stints
    }

    pub fn weather(&self) -> &WeatherMap {
        &self.weather
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            laps: self.laps.clone(),
            stints: self.stints.clone(),
            weather: self.weather.clone(),
        }
    }

    /// The driver's highest-numbered lap record.
    pub fn current_lap(&self, driver_number: u32) -> Option<(u32, &Lap)> {
        self.laps
            .get(&driver_number)
            .and_then(|laps| laps.last_key_value())
            .map(|(lap_number, lap)| (*lap_number, lap))
    }

    /// Lap times, positions and gaps from a `TimingData` payload.
    pub fn apply_timing_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<TrackerError> {
        let payload: TimingDataPayload = match serde_json::from_value(payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                return vec![TrackerError::InvalidPayload {
                    category: "TimingData".to_string(),
                    source: e,
                }];
            }
        };

        let mut errors = Vec::new();
        for (driver, line) in payload.lines {
            let driver_number = match parse_driver_number(&driver) {
                Ok(number) => number,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            match serde_json::from_value::<TimingLine>(line) {
                Ok(line) => self.apply_timing_line(driver_number, &line, timestamp, &mut errors),
                Err(e) => errors.push(TrackerError::InvalidPayload {
                    category: "TimingData".to_string(),
                    source: e,
                }),
            }
        }
        errors
    }

    fn apply_timing_line(
        &mut self,
        driver_number: u32,
        line: &TimingLine,
        timestamp: DateTime<Utc>,
        errors: &mut Vec<TrackerError>,
    ) {
        if let (Some(lap_time), Some(lap_count)) = (&line.last_lap_time, &line.number_of_laps) {
            match completed_lap(lap_time, lap_count, "NumberOfLaps") {
                Ok(Some((lap_number, seconds))) => {
                    self.record_lap(driver_number, lap_number, seconds, timestamp, true)
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if let Some(position) = &line.position {
            match position.as_u32("Position") {
                Ok(position) => self.current_lap_mut(driver_number).position = Some(position),
                Err(e) => errors.push(e),
            }
        }

        if let Some(gap) = &line.gap_to_leader {
            match numeric_gap(gap, true) {
                Ok(Some(gap)) => self.current_lap_mut(driver_number).gap_to_leader = Some(gap),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if let Some(interval) = &line.interval_to_position_ahead {
            match numeric_gap(interval, false) {
                Ok(Some(gap)) => self.current_lap_mut(driver_number).gap_to_ahead = Some(gap),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }
    }

    /// Stints and stint-reported lap times from a `TimingAppData` payload.
    pub fn apply_timing_app_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<TrackerError> {
        let payload: TimingAppDataPayload = match serde_json::from_value(payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                return vec![TrackerError::InvalidPayload {
                    category: "TimingAppData".to_string(),
                    source: e,
                }];
            }
        };

        let mut errors = Vec::new();
        for (driver, line) in payload.lines {
            let line = match serde_json::from_value::<TimingAppLine>(line) {
                Ok(line) => line,
                Err(e) => {
                    errors.push(TrackerError::InvalidPayload {
                        category: "TimingAppData".to_string(),
                        source: e,
                    });
                    continue;
                }
            };
            let Some(stints) = line.stints else {
                continue;
            };
            let driver_number = match parse_driver_number(&driver) {
                Ok(number) => number,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            match stints {
                StintsField::Keyed(stints) => {
                    for (stint_no, entry) in stints {
                        let stint_number = match stint_no.trim().parse::<u32>() {
                            Ok(number) => number,
                            Err(_) => {
                                errors.push(TrackerError::InvalidStintNumber { value: stint_no });
                                continue;
                            }
                        };
                        let entry = match serde_json::from_value::<StintEntry>(entry) {
                            Ok(entry) => entry,
                            Err(e) => {
                                errors.push(TrackerError::InvalidPayload {
                                    category: "TimingAppData".to_string(),
                                    source: e,
                                });
                                continue;
                            }
                        };

                        if let (Some(lap_time), Some(lap_number)) =
                            (&entry.lap_time, &entry.lap_number)
                        {
                            match completed_lap(lap_time, lap_number, "LapNumber") {
                                Ok(Some((lap_number, seconds))) => self.record_lap(
                                    driver_number,
                                    lap_number,
                                    seconds,
                                    timestamp,
                                    false,
                                ),
                                Ok(None) => {}
                                Err(e) => errors.push(e),
                            }
                        }
                        self.upsert_stint(driver_number, stint_number, &entry, &mut errors);
                    }
                }
                StintsField::Listed(stints) => {
                    let Some(first) = stints.into_iter().next() else {
                        continue;
                    };
                    match serde_json::from_value::<StintEntry>(first) {
                        Ok(entry) => {
                            let stint_number = self.next_stint_number(driver_number);
                            self.upsert_stint(driver_number, stint_number, &entry, &mut errors);
                        }
                        Err(e) => errors.push(TrackerError::InvalidPayload {
                            category: "TimingAppData".to_string(),
                            source: e,
                        }),
                    }
                }
                StintsField::Other(_) => {}
            }
        }
        errors
    }

    /// Weather fields for the sample at `timestamp`.
    pub fn apply_weather_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<TrackerError> {
        let payload: WeatherPayload = match serde_json::from_value(payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                return vec![TrackerError::InvalidPayload {
                    category: "WeatherData".to_string(),
                    source: e,
                }];
            }
        };

        let mut errors = Vec::new();
        let sample = self.weather.entry(timestamp).or_default();
        let fields = [
            (&payload.air_temp, "AirTemp", &mut sample.air_temp),
            (&payload.track_temp, "TrackTemp", &mut sample.track_temp),
            (&payload.wind_speed, "WindSpeed", &mut sample.wind_speed),
            (&payload.rainfall, "Rainfall", &mut sample.rainfall),
        ];
        for (value, field, slot) in fields {
            match value {
                Some(value) if !value.is_blank() => match value.as_f64(field) {
                    Ok(v) => *slot = Some(v),
                    Err(e) => errors.push(e),
                },
                _ => {}
            }
        }
        errors
    }

    /// Record a lap time. A new lap inherits the position of the nearest
    /// earlier lap (or the driver's latest lap when there is none).
    fn record_lap(
        &mut self,
        driver_number: u32,
        lap_number: u32,
        seconds: f64,
        timestamp: DateTime<Utc>,
        overwrite_time: bool,
    ) {
        let laps = self.laps.entry(driver_number).or_default();
        if let Some(existing) = laps.get_mut(&lap_number) {
            if overwrite_time {
                existing.time = Some(seconds);
                existing.completed_at.get_or_insert(timestamp);
            }
            return;
        }

        let carried_position = laps
            .range(..lap_number)
            .next_back()
            .or_else(|| laps.last_key_value())
            .and_then(|(_, lap)| lap.position);
        laps.insert(lap_number, Lap::new(seconds, carried_position, timestamp));
    }

    /// The driver's highest lap record, creating the lap 0 slot for an unseen driver.
    fn current_lap_mut(&mut self, driver_number: u32) -> &mut Lap {
        let laps = self.laps.entry(driver_number).or_default();
        let current = laps.keys().next_back().copied().unwrap_or(0);
        laps.entry(current).or_default()
    }

    fn next_stint_number(&self, driver_number: u32) -> u32 {
        self.stints
            .get(&driver_number)
            .and_then(|stints| stints.keys().next_back())
            .map_or(0, |highest| highest + 1)
    }

    fn upsert_stint(
        &mut self,
        driver_number: u32,
        stint_number: u32,
        entry: &StintEntry,
        errors: &mut Vec<TrackerError>,
    ) {
        let stint = self
            .stints
            .entry(driver_number)
            .or_default()
            .entry(stint_number)
            .or_default();

        if let Some(compound) = &entry.compound {
            match compound.text() {
                Some(text) => stint.compound = Compound::from(text.as_str()),
                None => errors.push(TrackerError::InvalidField {
                    field: "Compound".to_string(),
                    value: format!("{compound:?}"),
                }),
            }
        }
        if let Some(is_new) = &entry.new {
            match is_new.as_bool("New") {
                Ok(is_new) => stint.is_new = is_new,
                Err(e) => errors.push(e),
            }
        }
        if let Some(total_laps) = &entry.total_laps {
            match total_laps.as_u32("TotalLaps") {
                Ok(total_laps) => stint.record_total_laps(total_laps),
                Err(e) => errors.push(e),
            }
        }
        if let Some(start_laps) = &entry.start_laps {
            match start_laps.as_u32("StartLaps") {
                Ok(start_laps) => stint.start_laps = start_laps,
                Err(e) => errors.push(e),
            }
        }
    }
}

fn parse_driver_number(driver: &str) -> Result<u32, TrackerError> {
    driver
        .trim()
        .parse::<u32>()
        .map_err(|_| TrackerError::InvalidDriverNumber {
            value: driver.to_string(),
        })
}

/// Lap number and duration of a completed lap, `None` when the feed sent an
/// empty lap time.
fn completed_lap(
    lap_time: &FeedValue,
    lap_number: &FeedValue,
    lap_field: &str,
) -> Result<Option<(u32, f64)>, TrackerError> {
    let Some(lap_time) = lap_time.text().filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    let lap_number = lap_number.as_u32(lap_field)?;
    let seconds = parse_duration(lap_time.trim())?;
    Ok(Some((lap_number, seconds)))
}

/// A gap in seconds, or `None` when the feed reports a lapped car (any value
/// containing `L`). An empty leader gap is the leader itself and reads as 0.
fn numeric_gap(value: &FeedValue, empty_is_zero: bool) -> Result<Option<f64>, TrackerError> {
    let Some(text) = value.text() else {
        return Ok(None);
    };
    if text.contains('L') || (text.trim().is_empty() && !empty_is_zero) {
        return Ok(None);
    }
    parse_gap(&text).map(Some)
}
