use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::{Parser, Subcommand};
use livetiming::{
    JsonSeriesRenderer, LiveTracker, Renderer, TrackerConfig, TrackerError, spawn_render_worker,
};
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tail a live feed log and re-render every polling interval
    Track {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        results: Option<PathBuf>,

        #[arg(short, long)]
        interval: Option<u64>,

        /// Persist the effective settings as the local config file
        #[arg(long)]
        save_config: bool,
    },
    /// Ingest a finished feed log once and render it
    Replay {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        results: Option<PathBuf>,
    },
}

fn renderers(config: &TrackerConfig) -> Vec<Box<dyn Renderer + Send>> {
    vec![Box::new(JsonSeriesRenderer::new(config.images_dir()))]
}

fn track(config: TrackerConfig, cancel: Arc<AtomicBool>) -> Result<(), TrackerError> {
    let (snapshot_tx, render_worker) = spawn_render_worker(renderers(&config));
    let mut tracker = LiveTracker::new(&config, snapshot_tx)?;
    tracker.run(&cancel);

    // dropping the tracker closes the snapshot channel so the worker can finish
    drop(tracker);
    render_worker.join().map_err(|_| TrackerError::RenderQueueClosed)
}

fn replay(config: TrackerConfig) -> Result<(), TrackerError> {
    let (snapshot_tx, render_worker) = spawn_render_worker(renderers(&config));
    let mut tracker = LiveTracker::new(&config, snapshot_tx)?;
    let outcome = tracker.run_cycle();
    info!(
        "Replayed {} drivers, {} weather samples",
        tracker.state().laps().len(),
        tracker.state().weather().len()
    );
    if !outcome.rendered {
        info!("Nothing was rendered");
    }

    drop(tracker);
    render_worker.join().map_err(|_| TrackerError::RenderQueueClosed)
}

fn main() {
    colog::init();

    let cli = Args::parse();
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_cancel = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        println!("Exiting...");
        handler_cancel.store(true, Ordering::SeqCst);
    })
    .expect("Could not set Ctrl-C handler");

    match cli.command {
        Commands::Track {
            config,
            source,
            results,
            interval,
            save_config,
        } => {
            let mut tracker_config = match config {
                Some(path) => TrackerConfig::from_file(&path).expect("Could not load config file"),
                None => TrackerConfig::from_local_file().unwrap_or_default(),
            };
            if let Some(source) = source {
                tracker_config.file_name = source;
            }
            if let Some(results) = results {
                tracker_config.results_dir = results;
            }
            if let Some(interval) = interval {
                tracker_config.poll_interval_s = interval;
            }
            if save_config {
                tracker_config.save().expect("Could not save config file");
            }
            track(tracker_config, cancel).expect("Error while tracking live timing");
        }
        Commands::Replay { input, results } => {
            let mut tracker_config = TrackerConfig {
                file_name: input.display().to_string(),
                source_dir: PathBuf::new(),
                ..TrackerConfig::from_local_file().unwrap_or_default()
            };
            if let Some(results) = results {
                tracker_config.results_dir = results;
            }
            replay(tracker_config).expect("Error while replaying feed log");
        }
    };
}
