// Hand-off of race snapshots to chart renderers

pub mod json_renderer;
pub mod series;

use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use log::{debug, error};

use crate::{
    errors::TrackerError,
    race::{RaceSnapshot, WeatherField},
};

pub use json_renderer::JsonSeriesRenderer;

/// One chart family. Each render cycle calls every renderer once per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartFamily {
    Tyres,
    GapToAhead,
    GapToTop,
    Position,
    LapTime,
    LapTimeDelta,
    Weather(WeatherField),
}

impl ChartFamily {
    pub fn all() -> Vec<ChartFamily> {
        let mut families = vec![
            ChartFamily::Tyres,
            ChartFamily::GapToAhead,
            ChartFamily::GapToTop,
            ChartFamily::Position,
            ChartFamily::LapTime,
            ChartFamily::LapTimeDelta,
        ];
        families.extend(WeatherField::ALL.into_iter().map(ChartFamily::Weather));
        families
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartFamily::Tyres => "tyres",
            ChartFamily::GapToAhead => "gap_ahead",
            ChartFamily::GapToTop => "gap_top",
            ChartFamily::Position => "position",
            ChartFamily::LapTime => "laptime",
            ChartFamily::LapTimeDelta => "laptime_diffs",
            ChartFamily::Weather(field) => field.file_stem(),
        }
    }
}

/// A chart renderer. Renderers receive an immutable snapshot and never see
/// the live race state.
pub trait Renderer {
    fn render(&mut self, chart: ChartFamily, snapshot: &RaceSnapshot) -> Result<(), TrackerError>;
}

/// Render every chart family with every renderer, logging failures.
pub fn render_all(renderers: &mut [Box<dyn Renderer + Send>], snapshot: &RaceSnapshot) {
    for chart in ChartFamily::all() {
        for renderer in renderers.iter_mut() {
            if let Err(e) = renderer.render(chart, snapshot) {
                error!("Renderer failed for {}: {}", chart.file_stem(), e);
            }
        }
    }
}

/// Start the render worker. The polling loop sends snapshots and moves on;
/// when several snapshots queue up only the newest one is rendered.
///
/// The worker exits once every sender has been dropped.
pub fn spawn_render_worker(
    renderers: Vec<Box<dyn Renderer + Send>>,
) -> (Sender<Arc<RaceSnapshot>>, JoinHandle<()>) {
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let handle = thread::spawn(move || run_render_worker(renderers, snapshot_rx));
    (snapshot_tx, handle)
}

fn run_render_worker(
    mut renderers: Vec<Box<dyn Renderer + Send>>,
    snapshot_rx: Receiver<Arc<RaceSnapshot>>,
) {
    while let Ok(mut snapshot) = snapshot_rx.recv() {
        let mut skipped = 0;
        while let Ok(newer) = snapshot_rx.try_recv() {
            snapshot = newer;
            skipped += 1;
        }
        if skipped > 0 {
            debug!("Coalesced {} stale snapshots", skipped);
        }
        render_all(&mut renderers, &snapshot);
    }
}
