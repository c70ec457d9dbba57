use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One driver's lap record. Lap `0` is the slot used before lap 1 completes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Lap {
    /// Last completed lap duration in seconds
    pub time: Option<f64>,
    /// Running race position, carried forward from the previous lap
    pub position: Option<u32>,
    /// Interval to the car directly ahead, seconds
    pub gap_to_ahead: Option<f64>,
    /// Gap to the race leader, seconds
    pub gap_to_leader: Option<f64>,
    /// Feed timestamp of the message that created this lap
    pub completed_at: Option<DateTime<Utc>>,
}

impl Lap {
    pub fn new(time: f64, position: Option<u32>, completed_at: DateTime<Utc>) -> Self {
        Self {
            time: Some(time),
            position,
            gap_to_ahead: None,
            gap_to_leader: None,
            completed_at: Some(completed_at),
        }
    }
}
