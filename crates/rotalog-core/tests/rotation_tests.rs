//! Integration tests for size and date rotation through the public API.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};
use rotalog_core::{
    ArchiveKind, Inventory, Level, LogError, ManualClock, RotationMode, RotationOutcome, Sink,
    SizeUnit,
};
use tempfile::TempDir;

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn quiet_sink() -> Sink {
    Sink::builder()
        .level(Level::Info)
        .console(false)
        // Keep the monitor out of the way of explicit checks.
        .monitor_interval(Duration::from_secs(3600))
        .build()
}

/// Lines of roughly 110 bytes each.
fn write_bytes(sink: &Sink, lines: usize) {
    for i in 0..lines {
        // Timestamp, location and tag take up the rest of the line.
        sink.info(format_args!("{:0>width$}", i, width = 60));
    }
}

// ============================================================================
// Size Rotation
// ============================================================================

#[test]
fn test_write_at_threshold_rotates_first() {
    let temp = TempDir::new().unwrap();
    let sink = quiet_sink();
    sink.rotate_by_size(temp.path(), "app.log", 1, 3, SizeUnit::KB)
        .unwrap();

    let active = temp.path().join("app.log");
    while fs::metadata(&active).unwrap().len() < 1024 {
        sink.info(format_args!("filler line"));
    }
    assert!(!temp.path().join("app.log.1").exists());
    let before = read(&active);

    sink.info(format_args!("first line after rotation"));
    sink.close();

    assert_eq!(read(&temp.path().join("app.log.1")), before);
    let after = read(&active);
    assert_eq!(after.lines().count(), 1);
    assert!(after.ends_with("info: first line after rotation\n"));
    assert!(!temp.path().join("app.log.2").exists());
}

#[test]
fn test_three_generations_after_four_rotations() {
    let temp = TempDir::new().unwrap();
    let sink = quiet_sink();
    sink.rotate_by_size(temp.path(), "app.log", 1, 3, SizeUnit::MB)
        .unwrap();

    for round in 1..=4 {
        sink.info(format_args!("round {}", round));
        assert_eq!(sink.rotate_now().unwrap(), RotationOutcome::Rotated);
    }
    sink.close();

    let inventory = Inventory::scan(temp.path(), "app.log").unwrap();
    let kinds: Vec<_> = inventory.entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ArchiveKind::Active,
            ArchiveKind::Generation(1),
            ArchiveKind::Generation(2),
            ArchiveKind::Generation(3),
        ]
    );

    assert!(read(&temp.path().join("app.log.1")).contains("round 4"));
    assert!(read(&temp.path().join("app.log.2")).contains("round 3"));
    assert!(read(&temp.path().join("app.log.3")).contains("round 2"));
    assert!(!temp.path().join("app.log.4").exists());
}

#[test]
fn test_single_generation_keeps_no_archive() {
    let temp = TempDir::new().unwrap();
    let sink = quiet_sink();
    sink.rotate_by_size(temp.path(), "app.log", 1, 1, SizeUnit::KB)
        .unwrap();

    write_bytes(&sink, 40);
    sink.close();

    let inventory = Inventory::scan(temp.path(), "app.log").unwrap();
    assert_eq!(inventory.entries.len(), 1);
    assert_eq!(inventory.entries[0].kind, ArchiveKind::Active);
    assert!(inventory.entries[0].size < 1024 + 128);
}

#[test]
fn test_size_units_scale_threshold() {
    let temp = TempDir::new().unwrap();
    let sink = quiet_sink();
    sink.rotate_by_size(temp.path(), "app.log", 2, 5, SizeUnit::KB)
        .unwrap();

    // ~2700 bytes: one rotation at 2 KiB.
    write_bytes(&sink, 25);
    sink.close();

    assert!(temp.path().join("app.log.1").exists());
    assert!(!temp.path().join("app.log.2").exists());
    assert!(fs::metadata(temp.path().join("app.log.1")).unwrap().len() >= 2048);
}

#[test]
fn test_reconfiguration_keeps_original_file() {
    let temp = TempDir::new().unwrap();
    let sink = quiet_sink();
    sink.rotate_by_size(temp.path(), "app.log", 1, 3, SizeUnit::KB)
        .unwrap();

    let err = sink
        .rotate_by_size(temp.path(), "app.log", 50, 9, SizeUnit::MB)
        .unwrap_err();
    assert!(matches!(err, LogError::AlreadyConfigured(RotationMode::BySize)));

    // Still rotates at the original 1 KiB.
    write_bytes(&sink, 20);
    sink.close();
    assert!(temp.path().join("app.log.1").exists());
}

// ============================================================================
// Date Rotation
// ============================================================================

fn clock_at(day: u32, hour: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Local.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap(),
    ))
}

fn dated_sink(clock: Arc<ManualClock>) -> Sink {
    Sink::builder()
        .level(Level::Info)
        .console(false)
        .monitor_interval(Duration::from_secs(3600))
        .clock(clock)
        .build()
}

#[test]
fn test_daily_archives_are_named_after_their_day() {
    let temp = TempDir::new().unwrap();
    let clock = clock_at(10, 9);
    let sink = dated_sink(clock.clone());
    sink.rotate_by_date(temp.path(), "app.log", 1).unwrap();
    assert_eq!(sink.mode(), RotationMode::ByDate);

    sink.info(format_args!("day ten"));
    clock.advance_days(1);
    sink.info(format_args!("day eleven"));
    clock.advance_days(1);
    assert_eq!(sink.check_rotation().unwrap(), RotationOutcome::Rotated);
    sink.close();

    assert!(read(&temp.path().join("app.log.2026-03-10")).contains("day ten"));
    assert!(read(&temp.path().join("app.log.2026-03-11")).contains("day eleven"));
    assert!(read(&temp.path().join("app.log")).is_empty());
}

#[test]
fn test_existing_archive_makes_rotation_a_no_op() {
    let temp = TempDir::new().unwrap();
    let clock = clock_at(10, 9);
    let sink = dated_sink(clock.clone());
    sink.rotate_by_date(temp.path(), "app.log", 1).unwrap();
    fs::write(temp.path().join("app.log.2026-03-10"), "from elsewhere\n").unwrap();

    sink.info(format_args!("day ten"));
    clock.advance_days(1);

    assert_eq!(sink.check_rotation().unwrap(), RotationOutcome::Skipped);
    assert_eq!(sink.check_rotation().unwrap(), RotationOutcome::Skipped);
    sink.info(format_args!("still in the active file"));
    sink.close();

    assert_eq!(read(&temp.path().join("app.log.2026-03-10")), "from elsewhere\n");
    let active = read(&temp.path().join("app.log"));
    assert!(active.contains("day ten"));
    assert!(active.contains("still in the active file"));
}

#[test]
fn test_skipping_several_days_archives_once() {
    let temp = TempDir::new().unwrap();
    let clock = clock_at(10, 23);
    let sink = dated_sink(clock.clone());
    sink.rotate_by_date(temp.path(), "app.log", 7).unwrap();

    sink.info(format_args!("before the gap"));
    clock.advance_days(5);
    sink.info(format_args!("after the gap"));
    sink.info(format_args!("same day"));
    sink.close();

    let inventory = Inventory::scan(temp.path(), "app.log").unwrap();
    assert_eq!(inventory.entries.len(), 2);
    assert!(read(&temp.path().join("app.log.2026-03-10")).contains("before the gap"));
    assert_eq!(read(&temp.path().join("app.log")).lines().count(), 2);
}

// ============================================================================
// Monitor
// ============================================================================

#[test]
fn test_monitor_rotates_idle_sink() {
    let temp = TempDir::new().unwrap();
    let clock = clock_at(10, 9);
    let sink = Sink::builder()
        .level(Level::Info)
        .console(false)
        .monitor_interval(Duration::from_millis(10))
        .clock(clock.clone())
        .build();
    sink.rotate_by_date(temp.path(), "app.log", 1).unwrap();
    sink.info(format_args!("idle afterwards"));

    clock.advance_days(1);
    let archive = temp.path().join("app.log.2026-03-10");
    let deadline = Instant::now() + Duration::from_secs(5);
    while !archive.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    sink.close();

    assert!(read(&archive).contains("idle afterwards"));
}

#[test]
fn test_close_stops_monitor() {
    let temp = TempDir::new().unwrap();
    let clock = clock_at(10, 9);
    let sink = Sink::builder()
        .level(Level::Info)
        .console(false)
        .monitor_interval(Duration::from_millis(10))
        .clock(clock.clone())
        .build();
    sink.rotate_by_date(temp.path(), "app.log", 1).unwrap();
    sink.info(format_args!("last words"));

    sink.close();
    clock.advance_days(1);
    std::thread::sleep(Duration::from_millis(100));
    sink.info(format_args!("after close"));

    assert!(!temp.path().join("app.log.2026-03-10").exists());
    assert!(!read(&temp.path().join("app.log")).contains("after close"));
}
