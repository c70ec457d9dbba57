// Chart-ready series derived from a race snapshot

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::race::{Compound, Lap, RaceSnapshot, WeatherField};

/// Lap-time deltas beyond this are pit laps or incidents and are left out.
pub const MAX_LAP_DELTA_S: f64 = 5.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LapPoint {
    pub driver: u32,
    pub lap: u32,
    pub value: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StintBar {
    pub driver: u32,
    pub stint: u32,
    pub compound: Compound,
    pub is_new: bool,
    pub start_laps: u32,
    pub total_laps: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WeatherPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Drivers sorted by the position on their latest lap; unknown positions last.
pub fn driver_order(snapshot: &RaceSnapshot) -> Vec<u32> {
    snapshot
        .laps
        .iter()
        .map(|(driver, laps)| {
            let position = laps.last_key_value().and_then(|(_, lap)| lap.position);
            (*driver, position)
        })
        .sorted_by_key(|(driver, position)| (position.is_none(), *position, *driver))
        .map(|(driver, _)| driver)
        .collect()
}

fn lap_series(snapshot: &RaceSnapshot, value: impl Fn(&Lap) -> Option<f64>) -> Vec<LapPoint> {
    snapshot
        .laps
        .iter()
        .flat_map(|(driver, laps)| {
            laps.iter().filter_map(|(lap_number, lap)| {
                value(lap).map(|value| LapPoint {
                    driver: *driver,
                    lap: *lap_number,
                    value,
                })
            })
        })
        .collect()
}

pub fn lap_times(snapshot: &RaceSnapshot) -> Vec<LapPoint> {
    lap_series(snapshot, |lap| lap.time)
}

pub fn positions(snapshot: &RaceSnapshot) -> Vec<LapPoint> {
    lap_series(snapshot, |lap| lap.position.map(f64::from))
}

pub fn gaps_to_ahead(snapshot: &RaceSnapshot) -> Vec<LapPoint> {
    lap_series(snapshot, |lap| lap.gap_to_ahead)
}

pub fn gaps_to_leader(snapshot: &RaceSnapshot) -> Vec<LapPoint> {
    lap_series(snapshot, |lap| lap.gap_to_leader)
}

/// Difference to the previous lap, for consecutive laps that both have a time.
pub fn lap_time_deltas(snapshot: &RaceSnapshot) -> Vec<LapPoint> {
    let mut deltas = Vec::new();
    for driver in driver_order(snapshot) {
        let laps = &snapshot.laps[&driver];
        for ((prev_no, prev), (lap_no, lap)) in laps.iter().tuple_windows() {
            if *lap_no != prev_no + 1 {
                continue;
            }
            if let (Some(prev_time), Some(time)) = (prev.time, lap.time) {
                let delta = time - prev_time;
                if delta.abs() <= MAX_LAP_DELTA_S {
                    deltas.push(LapPoint {
                        driver,
                        lap: *lap_no,
                        value: delta,
                    });
                }
            }
        }
    }
    deltas
}

/// Stint bars grouped by driver in running order.
pub fn tyre_stints(snapshot: &RaceSnapshot) -> Vec<StintBar> {
    let mut order = driver_order(snapshot);
    order.extend(
        snapshot
            .stints
            .keys()
            .filter(|driver| !snapshot.laps.contains_key(driver))
            .copied(),
    );

    order
        .into_iter()
        .filter_map(|driver| snapshot.stints.get(&driver).map(|stints| (driver, stints)))
        .flat_map(|(driver, stints)| {
            stints.iter().map(move |(stint_no, stint)| StintBar {
                driver,
                stint: *stint_no,
                compound: stint.compound,
                is_new: stint.is_new,
                start_laps: stint.start_laps,
                total_laps: stint.total_laps,
            })
        })
        .collect()
}

pub fn weather(snapshot: &RaceSnapshot, field: WeatherField) -> Vec<WeatherPoint> {
    snapshot
        .weather
        .iter()
        .filter_map(|(timestamp, sample)| {
            field.value(sample).map(|value| WeatherPoint {
                timestamp: *timestamp,
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{RaceState, Stint};
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap()
    }

    fn lap_line(driver: &str, lap: u32, time: &str, position: &str) -> serde_json::Value {
        json!({"Lines": {driver: {
            "LastLapTime": {"Value": time},
            "NumberOfLaps": lap,
            "Position": position,
        }}})
    }

    #[test]
    fn test_driver_order_follows_latest_position() {
        let mut state = RaceState::new();
        state.apply_timing_data(&lap_line("1", 1, "1:30.000", "2"), ts(0));
        state.apply_timing_data(&lap_line("44", 1, "1:29.000", "1"), ts(0));
        state.apply_timing_data(&json!({"Lines": {"7": {"GapToLeader": "+1.0"}}}), ts(0));

        assert_eq!(driver_order(&state.snapshot()), vec![44, 1, 7]);
    }

    #[test]
    fn test_lap_time_deltas_skip_outliers_and_gaps() {
        let mut state = RaceState::new();
        state.apply_timing_data(&lap_line("1", 1, "1:30.000", "1"), ts(0));
        state.apply_timing_data(&lap_line("1", 2, "1:29.500", "1"), ts(1));
        state.apply_timing_data(&lap_line("1", 3, "1:50.000", "1"), ts(2));
        state.apply_timing_data(&lap_line("1", 5, "1:29.000", "1"), ts(3));

        let deltas = lap_time_deltas(&state.snapshot());
        assert_eq!(
            deltas,
            vec![LapPoint {
                driver: 1,
                lap: 2,
                value: -0.5
            }]
        );
    }

    #[test]
    fn test_tyre_stints_include_drivers_without_laps() {
        let mut snapshot = RaceSnapshot::default();
        snapshot.stints.entry(5).or_default().insert(
            0,
            Stint {
                compound: Compound::Hard,
                ..Stint::default()
            },
        );

        let bars = tyre_stints(&snapshot);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].driver, 5);
        assert_eq!(bars[0].compound, Compound::Hard);
    }

    #[test]
    fn test_weather_series_skips_missing_field() {
        let mut state = RaceState::new();
        state.apply_weather_data(&json!({"AirTemp": "21.0"}), ts(0));
        state.apply_weather_data(&json!({"TrackTemp": "35.0"}), ts(1));

        let air = weather(&state.snapshot(), WeatherField::AirTemp);
        assert_eq!(
            air,
            vec![WeatherPoint {
                timestamp: ts(0),
                value: 21.0
            }]
        );
    }
}
