// Library interface for livetiming
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod errors;
pub mod feed;
pub mod race;
pub mod render;
pub mod router;
pub mod side_channel;
pub mod tailer;
pub mod tracker;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use errors::TrackerError;
pub use feed::{FeedMessage, normalize_to_json, parse_duration};
pub use race::{Compound, Lap, RaceSnapshot, RaceState, Stint, WeatherSample};
pub use render::{ChartFamily, JsonSeriesRenderer, Renderer, spawn_render_worker};
pub use router::MessageRouter;
pub use side_channel::{SideChannel, SideChannelLogger, append_top};
pub use tailer::LogTailer;
pub use tracker::{CycleOutcome, LiveTracker};
