use serde::{Deserialize, Serialize};

/// Environmental reading for one feed timestamp. Fields fill in independently.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WeatherSample {
    pub air_temp: Option<f64>,
    pub track_temp: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Rain magnitude, not a flag
    pub rainfall: Option<f64>,
}

/// The individually plotted weather fields
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherField {
    AirTemp,
    Rainfall,
    TrackTemp,
    WindSpeed,
}

impl WeatherField {
    pub const ALL: [WeatherField; 4] = [
        WeatherField::AirTemp,
        WeatherField::Rainfall,
        WeatherField::TrackTemp,
        WeatherField::WindSpeed,
    ];

    pub fn value(&self, sample: &WeatherSample) -> Option<f64> {
        match self {
            WeatherField::AirTemp => sample.air_temp,
            WeatherField::Rainfall => sample.rainfall,
            WeatherField::TrackTemp => sample.track_temp,
            WeatherField::WindSpeed => sample.wind_speed,
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            WeatherField::AirTemp => "air_temp",
            WeatherField::Rainfall => "rainfall",
            WeatherField::TrackTemp => "track_temp",
            WeatherField::WindSpeed => "wind_speed",
        }
    }
}
