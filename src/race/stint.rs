use serde::{Deserialize, Serialize};

/// Tyre compound of a stint
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    #[default]
    Unknown,
}

impl From<&str> for Compound {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SOFT" => Compound::Soft,
            "MEDIUM" => Compound::Medium,
            "HARD" => Compound::Hard,
            "INTERMEDIATE" => Compound::Intermediate,
            "WET" => Compound::Wet,
            _ => Compound::Unknown,
        }
    }
}

impl std::fmt::Display for Compound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compound::Soft => write!(f, "SOFT"),
            Compound::Medium => write!(f, "MEDIUM"),
            Compound::Hard => write!(f, "HARD"),
            Compound::Intermediate => write!(f, "INTERMEDIATE"),
            Compound::Wet => write!(f, "WET"),
            Compound::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One tyre mounting period for one driver.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Stint {
    pub compound: Compound,
    /// Whether the set was unused when mounted
    pub is_new: bool,
    /// Tyre age in laps when the stint was first observed
    pub start_laps: u32,
    /// Laps run on this set so far
    pub total_laps: u32,
}

impl Stint {
    /// Total laps never go backwards within a stint.
    pub fn record_total_laps(&mut self, total_laps: u32) {
        self.total_laps = self.total_laps.max(total_laps);
    }
}
