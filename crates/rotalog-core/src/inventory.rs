//! What a sink has left on disk.
//!
//! The inventory is a read-only view: it can be taken at any time, from any
//! process, without touching the sink that owns the files.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{LogError, LogResult};
use crate::logging::entry::LogLine;
use crate::rotation::{ArchiveKind, SinkTarget};

/// Line counts per tag.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LevelStats {
    pub total: usize,
    /// Lines that are not in the sink's format, e.g. continuation lines.
    pub unparsed: usize,
    pub by_tag: BTreeMap<String, usize>,
}

impl LevelStats {
    fn record(&mut self, line: &str) {
        self.total += 1;
        match LogLine::parse(line) {
            Some(parsed) => *self.by_tag.entry(parsed.tag.to_string()).or_default() += 1,
            None => self.unparsed += 1,
        }
    }

    fn merge(&mut self, other: &LevelStats) {
        self.total += other.total;
        self.unparsed += other.unparsed;
        for (tag, count) in &other.by_tag {
            *self.by_tag.entry(tag.clone()).or_default() += count;
        }
    }

    pub fn count(&self, tag: &str) -> usize {
        self.by_tag.get(tag).copied().unwrap_or(0)
    }
}

/// One file belonging to a sink.
#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub path: PathBuf,
    pub kind: ArchiveKind,
    pub size: u64,
    pub stats: LevelStats,
}

impl InventoryEntry {
    pub fn lines(&self) -> usize {
        self.stats.total
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The active file and archives of one sink.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub dir: PathBuf,
    pub base: String,
    /// Active file first, then generations oldest-last, then dated
    /// archives newest-first.
    pub entries: Vec<InventoryEntry>,
}

impl Inventory {
    /// Scan `dir` for `base` and its archives. Unrelated files are ignored.
    pub fn scan(dir: impl AsRef<Path>, base: &str) -> LogResult<Self> {
        let target = SinkTarget::new(dir, base)?;
        let dir = target.dir();

        let read_dir = fs::read_dir(dir)
            .map_err(|e| LogError::io(format!("reading {}", dir.display()), e))?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry =
                dir_entry.map_err(|e| LogError::io(format!("reading {}", dir.display()), e))?;
            let name = dir_entry.file_name();
            let Some(kind) = name.to_str().and_then(|n| target.classify(n)) else {
                continue;
            };
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            entries.push(scan_file(path, kind)?);
        }

        entries.sort_by_key(|entry| sort_key(entry.kind));

        Ok(Self {
            dir: dir.to_path_buf(),
            base: base.to_string(),
            entries,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn total_lines(&self) -> usize {
        self.entries.iter().map(|e| e.lines()).sum()
    }

    /// Stats across every file.
    pub fn stats(&self) -> LevelStats {
        let mut stats = LevelStats::default();
        for entry in &self.entries {
            stats.merge(&entry.stats);
        }
        stats
    }

    /// Plain-text table, one row per file, then per-tag totals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}/{}", self.dir.display(), self.base);

        if self.entries.is_empty() {
            let _ = writeln!(out, "no log files found");
            return out;
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.file_name().len())
            .max()
            .unwrap_or(0)
            .max("FILE".len());

        let _ = writeln!(out, "{:<width$}  {:>10}  {:>8}  KIND", "FILE", "BYTES", "LINES");
        for entry in &self.entries {
            let kind = match entry.kind {
                ArchiveKind::Active => "active".to_string(),
                ArchiveKind::Generation(n) => format!("generation {}", n),
                ArchiveKind::Dated(day) => format!("dated {}", day),
            };
            let _ = writeln!(
                out,
                "{:<width$}  {:>10}  {:>8}  {}",
                entry.file_name(),
                entry.size,
                entry.lines(),
                kind
            );
        }
        let _ = writeln!(
            out,
            "{:<width$}  {:>10}  {:>8}",
            "total",
            self.total_size(),
            self.total_lines()
        );

        let stats = self.stats();
        if !stats.by_tag.is_empty() || stats.unparsed > 0 {
            let _ = writeln!(out);
            for (tag, count) in &stats.by_tag {
                let _ = writeln!(out, "{:<8} {}", tag, count);
            }
            if stats.unparsed > 0 {
                let _ = writeln!(out, "{:<8} {}", "other", stats.unparsed);
            }
        }
        out
    }
}

fn sort_key(kind: ArchiveKind) -> (u8, u32, Reverse<Option<chrono::NaiveDate>>) {
    match kind {
        ArchiveKind::Active => (0, 0, Reverse(None)),
        ArchiveKind::Generation(n) => (1, n, Reverse(None)),
        ArchiveKind::Dated(day) => (2, 0, Reverse(Some(day))),
    }
}

fn scan_file(path: PathBuf, kind: ArchiveKind) -> LogResult<InventoryEntry> {
    let file =
        File::open(&path).map_err(|e| LogError::io(format!("opening {}", path.display()), e))?;
    let size = file
        .metadata()
        .map_err(|e| LogError::io(format!("reading {}", path.display()), e))?
        .len();

    let mut stats = LevelStats::default();
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| LogError::io(format!("reading {}", path.display()), e))?;
        if read == 0 {
            break;
        }
        stats.record(&String::from_utf8_lossy(&buf));
    }

    Ok(InventoryEntry {
        path,
        kind,
        size,
        stats,
    })
}
