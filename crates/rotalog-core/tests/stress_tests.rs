//! Stress tests for concurrent writers on one sink.
//!
//! Many threads write while the file rotates underneath them; no line may be
//! lost, torn or duplicated.

use std::collections::HashSet;
use std::fs;
use std::thread;

use rotalog_core::{Inventory, LogLine, Sink, SizeUnit};
use tempfile::TempDir;

const WRITERS: usize = 100;
const LINES_PER_WRITER: usize = 1000;

#[test]
fn test_concurrent_writers_lose_no_lines() {
    let temp = TempDir::new().unwrap();
    let sink = Sink::builder().console(false).build();
    // ~6.5 MB of output against a 64 KiB threshold: about a hundred
    // rotations, all of them retained.
    sink.rotate_by_size(temp.path(), "stress.log", 64, 512, SizeUnit::KB)
        .unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let sink = sink.clone();
            thread::spawn(move || {
                for line in 0..LINES_PER_WRITER {
                    sink.error(format_args!("writer {} line {}", writer, line));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    sink.close();

    let inventory = Inventory::scan(temp.path(), "stress.log").unwrap();
    let stats = inventory.stats();
    assert!(inventory.entries.len() > 10, "expected many rotations");
    assert_eq!(stats.count("error"), WRITERS * LINES_PER_WRITER);
    assert_eq!(stats.unparsed, 0);

    // Every (writer, line) pair exactly once.
    let mut seen = HashSet::new();
    for entry in &inventory.entries {
        let content = fs::read_to_string(&entry.path).unwrap();
        for text in content.lines() {
            let parsed = LogLine::parse(text).unwrap();
            if parsed.tag != "error" {
                continue;
            }
            assert!(seen.insert(parsed.message.to_string()), "duplicate {}", text);
        }
    }
    assert_eq!(seen.len(), WRITERS * LINES_PER_WRITER);
}

#[test]
fn test_archives_never_exceed_threshold_by_more_than_one_line() {
    let temp = TempDir::new().unwrap();
    let sink = Sink::builder().console(false).build();
    sink.rotate_by_size(temp.path(), "bounded.log", 4, 64, SizeUnit::KB)
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|writer| {
            let sink = sink.clone();
            thread::spawn(move || {
                for line in 0..500 {
                    sink.error(format_args!("writer {} line {}", writer, line));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    sink.close();

    let inventory = Inventory::scan(temp.path(), "bounded.log").unwrap();
    for entry in &inventory.entries {
        assert!(entry.size < 4096 + 128, "{} is {} bytes", entry.file_name(), entry.size);
    }
}

#[test]
fn test_independent_sinks_do_not_interfere() {
    let temp = TempDir::new().unwrap();
    let sinks: Vec<_> = (0..4)
        .map(|i| {
            let sink = Sink::builder().console(false).build();
            sink.rotate_by_size(temp.path(), &format!("sink{}.log", i), 1, 100, SizeUnit::KB)
                .unwrap();
            sink
        })
        .collect();

    let handles: Vec<_> = sinks
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, sink)| {
            thread::spawn(move || {
                for line in 0..(200 * (i + 1)) {
                    sink.error(format_args!("line {}", line));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (i, sink) in sinks.iter().enumerate() {
        sink.close();
        let inventory = Inventory::scan(temp.path(), &format!("sink{}.log", i)).unwrap();
        assert_eq!(inventory.stats().count("error"), 200 * (i + 1));
    }
}
