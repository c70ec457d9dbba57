use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use super::{ChartFamily, Renderer, series};
use crate::{errors::TrackerError, race::RaceSnapshot};

/// Writes each chart family's series as a JSON-lines file for an external
/// plotting tool. Files are rewritten on every render.
pub struct JsonSeriesRenderer {
    output_dir: PathBuf,
}

impl JsonSeriesRenderer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn path_for(&self, chart: ChartFamily) -> PathBuf {
        self.output_dir.join(format!("{}.jsonl", chart.file_stem()))
    }
}

fn write_series<T: Serialize>(path: &Path, records: Vec<T>) -> Result<(), TrackerError> {
    serde_jsonlines::write_json_lines(path, records)
        .map_err(|e| TrackerError::WriterError { source: e })
}

impl Renderer for JsonSeriesRenderer {
    fn render(&mut self, chart: ChartFamily, snapshot: &RaceSnapshot) -> Result<(), TrackerError> {
        let path = self.path_for(chart);
        match chart {
            ChartFamily::Tyres => write_series(&path, series::tyre_stints(snapshot))?,
            ChartFamily::GapToAhead => write_series(&path, series::gaps_to_ahead(snapshot))?,
            ChartFamily::GapToTop => write_series(&path, series::gaps_to_leader(snapshot))?,
            ChartFamily::Position => write_series(&path, series::positions(snapshot))?,
            ChartFamily::LapTime => write_series(&path, series::lap_times(snapshot))?,
            ChartFamily::LapTimeDelta => write_series(&path, series::lap_time_deltas(snapshot))?,
            ChartFamily::Weather(field) => write_series(&path, series::weather(snapshot, field))?,
        }
        info!("Saved series to {}", path.display());
        Ok(())
    }
}
