// The polling loop: tail, route, trigger renders, write the heartbeat

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread,
    time::{Duration, Instant},
};

use chrono::Local;
use log::{error, info};

use crate::{
    config::TrackerConfig,
    errors::TrackerError,
    race::{RaceSnapshot, RaceState},
    router::MessageRouter,
    side_channel::SideChannelLogger,
    tailer::LogTailer,
};

pub const HEARTBEAT_FILE_NAME: &str = "timestamp.txt";
const CANCEL_CHECK_MS: u64 = 200;

/// What a single polling cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub new_data: bool,
    pub rendered: bool,
}

pub struct LiveTracker {
    tailer: LogTailer,
    router: MessageRouter,
    snapshot_tx: Sender<Arc<RaceSnapshot>>,
    heartbeat_path: PathBuf,
    poll_interval: Duration,
}

fn create_dir(path: &Path) -> Result<(), TrackerError> {
    fs::create_dir_all(path).map_err(|e| TrackerError::OutputDirError {
        path: path.display().to_string(),
        source: e,
    })
}

impl LiveTracker {
    /// Prepare the output directories, clear stale side-channel logs and set up
    /// a tailer on the configured source log. Snapshots go to `snapshot_tx`.
    pub fn new(
        config: &TrackerConfig,
        snapshot_tx: Sender<Arc<RaceSnapshot>>,
    ) -> Result<Self, TrackerError> {
        let logs_dir = config.logs_dir();
        create_dir(&logs_dir)?;
        create_dir(&config.images_dir())?;

        let side_channel = SideChannelLogger::new(logs_dir.clone());
        if config.clear_side_channels_on_start {
            side_channel.clear();
        }

        Ok(Self {
            tailer: LogTailer::new(config.source_path()),
            router: MessageRouter::new(side_channel),
            snapshot_tx,
            heartbeat_path: logs_dir.join(HEARTBEAT_FILE_NAME),
            poll_interval: Duration::from_secs(config.poll_interval_s),
        })
    }

    pub fn state(&self) -> &RaceState {
        self.router.state()
    }

    pub fn heartbeat_path(&self) -> &Path {
        &self.heartbeat_path
    }

    /// One polling cycle. Failures are logged; the heartbeat is written no
    /// matter what happened before it.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let router = &mut self.router;
        let new_data = match self.tailer.poll(|line| router.decode_and_route(line)) {
            Ok(new_data) => new_data,
            Err(e) => {
                error!("{}", e);
                false
            }
        };

        let rendered = if new_data {
            info!(
                "Consumed {} lines from {}",
                self.tailer.consumed_lines(),
                self.tailer.source().display()
            );
            self.trigger_render()
        } else {
            info!("render skipped");
            false
        };

        if let Err(e) = self.write_heartbeat() {
            error!("{}", e);
        }

        CycleOutcome { new_data, rendered }
    }

    fn trigger_render(&self) -> bool {
        let snapshot = Arc::new(self.router.state().snapshot());
        match self.snapshot_tx.send(snapshot) {
            Ok(()) => true,
            Err(_) => {
                error!("{}", TrackerError::RenderQueueClosed);
                false
            }
        }
    }

    fn write_heartbeat(&self) -> Result<(), TrackerError> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
        fs::write(&self.heartbeat_path, format!("{now}\n"))
            .map_err(|e| TrackerError::HeartbeatWriteError { source: e })
    }

    /// Poll until `cancel` is set. The flag is checked before every cycle and
    /// while sleeping between cycles.
    pub fn run(&mut self, cancel: &AtomicBool) {
        info!(
            "Tracking {} every {}s",
            self.tailer.source().display(),
            self.poll_interval.as_secs()
        );
        while !cancel.load(Ordering::SeqCst) {
            self.run_cycle();
            self.sleep_unless_cancelled(cancel);
        }
        info!("Tracking stopped");
    }

    fn sleep_unless_cancelled(&self, cancel: &AtomicBool) {
        let deadline = Instant::now() + self.poll_interval;
        while !cancel.load(Ordering::SeqCst) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(Duration::from_millis(CANCEL_CHECK_MS)));
        }
    }
}
