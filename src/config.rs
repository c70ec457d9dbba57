use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR: &str = "livetiming";
pub const POLL_INTERVAL_S: u64 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Source log to tail; relative names are looked up in `source_dir`
    #[serde(alias = "FileName")]
    pub file_name: String,
    pub source_dir: PathBuf,
    pub results_dir: PathBuf,
    pub poll_interval_s: u64,
    pub clear_side_channels_on_start: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            source_dir: PathBuf::from("live/data/source"),
            results_dir: PathBuf::from("live/data/results"),
            poll_interval_s: POLL_INTERVAL_S,
            clear_side_channels_on_start: true,
        }
    }
}

impl TrackerConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join(APP_DIR).join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Self::from_file(&config_path).ok()
        } else {
            None
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackerError> {
        let file =
            std::fs::File::open(path).map_err(|e| TrackerError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| TrackerError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), TrackerError> {
        let config_dir = dirs::config_dir()
            .ok_or(TrackerError::NoConfigDir)?
            .join(APP_DIR);

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .map_err(|e| TrackerError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_dir.join(CONFIG_FILE_NAME))
            .map_err(|e| TrackerError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TrackerError::ConfigSerializeError { source: e })
    }

    /// Names that are absolute or already point into `live/data/source` are
    /// used as they are.
    pub fn source_path(&self) -> PathBuf {
        let name = Path::new(&self.file_name);
        if name.is_absolute()
            || self.file_name.starts_with("live/")
            || self.file_name.contains("live/data/source")
        {
            name.to_path_buf()
        } else {
            self.source_dir.join(name)
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.results_dir.join("logs")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.results_dir.join("images")
    }
}
