// Integration tests for the live tracking loop
//
// These drive the public API the same way the binary does: a feed log on disk,
// a tracker polling it, and a channel standing in for the render worker.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::{Arc, mpsc};

use chrono::{TimeZone, Utc};
use livetiming::{
    CycleOutcome, LiveTracker, LogTailer, MessageRouter, RaceSnapshot, SideChannelLogger,
    TrackerConfig,
};
use tempfile::TempDir;

const SCENARIO: &str = r#"["TimingData", {"Lines": {"1": {"LastLapTime": {"Value": "1:23.456"}, "NumberOfLaps": 1}}}, "2024-01-01T00:00:00Z"]
["TimingData", {"Lines": {"1": {"Position": "3"}}}, "2024-01-01T00:00:05Z"]
["WeatherData", {"AirTemp": "22.5"}, "2024-01-01T00:00:10Z"]
"#;

fn setup(dir: &TempDir, contents: &str) -> TrackerConfig {
    let feed = dir.path().join("feed.txt");
    fs::write(&feed, contents).unwrap();
    TrackerConfig {
        file_name: feed.display().to_string(),
        results_dir: dir.path().join("results"),
        poll_interval_s: 0,
        ..Default::default()
    }
}

fn append(config: &TrackerConfig, line: &str) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(config.source_path())
        .unwrap();
    writeln!(file, "{}", line).unwrap();
}

#[test]
fn test_three_line_scenario_renders_once() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir, SCENARIO);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();

    let outcome = tracker.run_cycle();
    assert_eq!(
        outcome,
        CycleOutcome {
            new_data: true,
            rendered: true
        }
    );

    let snapshot = snapshot_rx.try_recv().expect("render should have been triggered");
    let lap = &snapshot.laps[&1][&1];
    assert!((lap.time.unwrap() - 83.456).abs() < 1e-9);
    assert_eq!(lap.position, Some(3));

    assert_eq!(snapshot.weather.len(), 1);
    let (timestamp, sample) = snapshot.weather.iter().next().unwrap();
    assert_eq!(*timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap());
    assert_eq!(sample.air_temp, Some(22.5));

    assert_eq!(*snapshot, tracker.state().snapshot());
}

#[test]
fn test_second_cycle_without_growth_skips_render() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir, SCENARIO);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();

    tracker.run_cycle();
    snapshot_rx.try_recv().unwrap();
    let state_after_first = tracker.state().clone();
    let first_heartbeat = fs::read_to_string(tracker.heartbeat_path()).unwrap();

    let outcome = tracker.run_cycle();
    assert_eq!(
        outcome,
        CycleOutcome {
            new_data: false,
            rendered: false
        }
    );
    assert!(snapshot_rx.try_recv().is_err());
    assert_eq!(tracker.state(), &state_after_first);

    // heartbeat is refreshed every cycle, rendered or not
    let second_heartbeat = fs::read_to_string(tracker.heartbeat_path()).unwrap();
    assert_eq!(second_heartbeat.lines().count(), 1);
    assert!(second_heartbeat >= first_heartbeat);
}

#[test]
fn test_appended_lines_trigger_another_render() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir, SCENARIO);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();
    tracker.run_cycle();
    snapshot_rx.try_recv().unwrap();

    append(
        &config,
        r#"["TimingData", {"Lines": {"1": {"LastLapTime": {"Value": "1:22.000"}, "NumberOfLaps": 2}}}, "2024-01-01T00:01:30Z"]"#,
    );
    append(
        &config,
        "['TimingAppData', {'Lines': {'1': {'Stints': [{'Compound': 'SOFT', 'New': 'true', 'TotalLaps': 0}]}}}, '2024-01-01T00:01:31Z']",
    );

    assert!(tracker.run_cycle().rendered);
    let snapshot = snapshot_rx.try_recv().unwrap();
    assert_eq!(snapshot.laps[&1][&2].position, Some(3));
    assert_eq!(snapshot.laps[&1][&2].time, Some(82.0));
    assert_eq!(snapshot.stints[&1].len(), 1);
    assert!(snapshot.stints[&1][&0].is_new);
}

#[test]
fn test_replaying_consumed_lines_does_not_change_state() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir, SCENARIO);

    let mut once = MessageRouter::new(SideChannelLogger::new(dir.path().to_path_buf()));
    let mut twice = MessageRouter::new(SideChannelLogger::new(dir.path().to_path_buf()));
    for line in SCENARIO.lines() {
        once.decode_and_route(line);
    }
    for _ in 0..2 {
        for line in SCENARIO.lines() {
            twice.decode_and_route(line);
        }
    }
    assert_eq!(once.state(), twice.state());

    // the tailer itself never hands the same lines over twice
    let mut tailer = LogTailer::new(config.source_path());
    let mut router = MessageRouter::new(SideChannelLogger::new(dir.path().to_path_buf()));
    tailer.poll(|line| router.decode_and_route(line)).unwrap();
    let mut delivered = 0;
    tailer.poll(|_| delivered += 1).unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(router.state(), once.state());
}

#[test]
fn test_line_written_in_two_parts_is_ingested_once_complete() {
    let dir = TempDir::new().unwrap();
    let line = r#"["TimingData", {"Lines": {"1": {"LastLapTime": {"Value": "1:23.456"}, "NumberOfLaps": 1}}}, "2024-01-01T00:00:00Z"]"#;
    let (head, tail) = line.split_at(40);
    let config = setup(&dir, head);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();

    tracker.run_cycle();
    assert!(snapshot_rx.try_recv().unwrap().laps.is_empty());

    let mut file = OpenOptions::new()
        .append(true)
        .open(config.source_path())
        .unwrap();
    writeln!(file, "{}", tail).unwrap();

    assert!(tracker.run_cycle().rendered);
    let snapshot = snapshot_rx.try_recv().unwrap();
    assert!((snapshot.laps[&1][&1].time.unwrap() - 83.456).abs() < 1e-9);
}

#[test]
fn test_invalid_utf8_line_does_not_stop_ingestion() {
    let dir = TempDir::new().unwrap();
    let feed = dir.path().join("feed.txt");
    let mut contents = b"garbage \xff\xfe line\n".to_vec();
    contents.extend_from_slice(SCENARIO.as_bytes());
    fs::write(&feed, contents).unwrap();
    let config = TrackerConfig {
        file_name: feed.display().to_string(),
        results_dir: dir.path().join("results"),
        poll_interval_s: 0,
        ..Default::default()
    };
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();

    assert!(tracker.run_cycle().rendered);
    let snapshot = snapshot_rx.try_recv().unwrap();
    assert_eq!(snapshot.laps[&1][&1].position, Some(3));
}

#[test]
fn test_bad_lines_do_not_stop_ingestion() {
    let dir = TempDir::new().unwrap();
    let contents = format!(
        "{}\n{}\n{}\n{}",
        "garbage",
        r#"["TimingData", {"Lines": {"44": {"Position": "1"}}}, "not a timestamp"]"#,
        r#"["TimingData", {"Lines": {"44": {"LastLapTime": {"Value": "1:2:3:4"}, "NumberOfLaps": 1, "Position": "2"}}}, "2024-01-01T00:00:00Z"]"#,
        SCENARIO
    );
    let config = setup(&dir, &contents);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();

    assert!(tracker.run_cycle().rendered);
    let snapshot = snapshot_rx.try_recv().unwrap();
    assert_eq!(snapshot.laps[&44][&0].position, Some(2));
    assert!(!snapshot.laps[&44].contains_key(&1));
    assert_eq!(snapshot.laps[&1][&1].position, Some(3));
}

#[test]
fn test_side_channel_files_are_newest_first() {
    let dir = TempDir::new().unwrap();
    let contents = [
        "['TrackStatus', {'Status': '2', 'Message': 'Yellow'}, '2024-01-01T00:00:00Z']",
        "['TrackStatus', {'Status': '1', 'Message': 'AllClear'}, '2024-01-01T00:00:30Z']",
        "['RaceControlMessages', {'Messages': [{'Category': 'Flag', 'Flag': 'GREEN'}]}, '2024-01-01T00:00:31Z']",
    ]
    .map(|line| format!("{line}\n"))
    .concat();
    let config = setup(&dir, &contents);
    let (snapshot_tx, _snapshot_rx) = mpsc::channel::<Arc<RaceSnapshot>>();
    let mut tracker = LiveTracker::new(&config, snapshot_tx).unwrap();
    tracker.run_cycle();

    let track_status = fs::read_to_string(config.logs_dir().join("track_status.txt")).unwrap();
    let lines: Vec<&str> = track_status.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("2024-01-01T00:00:30Z : "));
    assert!(lines[0].contains("AllClear"));
    assert!(lines[1].contains("Yellow"));

    let race_control = fs::read_to_string(config.logs_dir().join("race_control.txt")).unwrap();
    assert!(race_control.contains("GREEN"));
}
