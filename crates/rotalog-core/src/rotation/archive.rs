//! Archive naming and generation retention.
//!
//! ```text
//! logs/
//! ├── app.log              # active file
//! ├── app.log.1            # size mode: most recent generation
//! ├── app.log.2
//! └── app.log.2026-01-21   # date mode: one archive per day
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{LogError, LogResult};

/// Date format used in dated archive suffixes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Directory and base file name of a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    dir: PathBuf,
    base: String,
    active: PathBuf,
}

impl SinkTarget {
    pub fn new(dir: impl AsRef<Path>, base: impl Into<String>) -> LogResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let base = base.into();
        if dir.as_os_str().is_empty() {
            return Err(LogError::InvalidParameter("dir must not be empty".into()));
        }
        if base.is_empty() {
            return Err(LogError::InvalidParameter("base name must not be empty".into()));
        }
        if base.contains(['/', '\\']) {
            return Err(LogError::InvalidParameter(format!(
                "base name '{}' must be a plain file name",
                base
            )));
        }
        let active = dir.join(&base);
        Ok(Self { dir, base, active })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<dir>/<base>`
    pub fn active_path(&self) -> &Path {
        &self.active
    }

    /// `<dir>/<base>.<n>`
    pub fn generation_path(&self, n: u32) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base, n))
    }

    /// `<dir>/<base>.<YYYY-MM-DD>`
    pub fn dated_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.base, date.format(DATE_FORMAT)))
    }

    /// Classify a file name found in the sink directory.
    pub fn classify(&self, file_name: &str) -> Option<ArchiveKind> {
        if file_name == self.base {
            return Some(ArchiveKind::Active);
        }
        let suffix = file_name.strip_prefix(&self.base)?.strip_prefix('.')?;
        if let Ok(n) = suffix.parse::<u32>() {
            if n > 0 && !suffix.starts_with('0') {
                return Some(ArchiveKind::Generation(n));
            }
            return None;
        }
        NaiveDate::parse_from_str(suffix, DATE_FORMAT)
            .ok()
            .map(ArchiveKind::Dated)
    }
}

/// What a file in the sink directory is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArchiveKind {
    Active,
    Generation(u32),
    Dated(NaiveDate),
}

/// Make room for a new `.1`: drop `.max_generations`, then move every
/// remaining `.n` to `.n+1`, highest first.
///
/// Failures are appended to `failures` and the shift continues.
pub(crate) fn shift_generations(
    target: &SinkTarget,
    max_generations: u32,
    failures: &mut Vec<String>,
) {
    for n in (1..=max_generations).rev() {
        let path = target.generation_path(n);
        if !path.exists() {
            continue;
        }
        if n == max_generations {
            if let Err(e) = fs::remove_file(&path) {
                failures.push(format!("removing {}: {}", path.display(), e));
            }
        } else {
            let next = target.generation_path(n + 1);
            if let Err(e) = fs::rename(&path, &next) {
                failures.push(format!(
                    "renaming {} to {}: {}",
                    path.display(),
                    next.display(),
                    e
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_target_paths() {
        let target = SinkTarget::new("/var/log/app", "app.log").unwrap();
        assert_eq!(target.active_path(), Path::new("/var/log/app/app.log"));
        assert_eq!(
            target.generation_path(3),
            PathBuf::from("/var/log/app/app.log.3")
        );
        assert_eq!(
            target.dated_path(day(2026, 1, 21)),
            PathBuf::from("/var/log/app/app.log.2026-01-21")
        );
    }

    #[test]
    fn test_target_rejects_empty_parts() {
        assert!(SinkTarget::new("", "app.log").is_err());
        assert!(SinkTarget::new("logs", "").is_err());
        assert!(SinkTarget::new("logs", "nested/app.log").is_err());
    }

    #[test]
    fn test_classify_file_names() {
        let target = SinkTarget::new("logs", "app.log").unwrap();
        assert_eq!(target.classify("app.log"), Some(ArchiveKind::Active));
        assert_eq!(target.classify("app.log.2"), Some(ArchiveKind::Generation(2)));
        assert_eq!(
            target.classify("app.log.2026-01-21"),
            Some(ArchiveKind::Dated(day(2026, 1, 21)))
        );
        assert_eq!(target.classify("app.log.0"), None);
        assert_eq!(target.classify("app.log.02"), None);
        assert_eq!(target.classify("app.logx"), None);
        assert_eq!(target.classify("other.log.1"), None);
    }

    #[test]
    fn test_shift_drops_oldest_and_moves_rest_up() {
        let temp = TempDir::new().unwrap();
        let target = SinkTarget::new(temp.path(), "app.log").unwrap();
        for n in 1..=3 {
            fs::write(target.generation_path(n), format!("gen {}", n)).unwrap();
        }

        let mut failures = Vec::new();
        shift_generations(&target, 3, &mut failures);

        assert!(failures.is_empty(), "{:?}", failures);
        assert!(!target.generation_path(1).exists());
        assert_eq!(fs::read_to_string(target.generation_path(2)).unwrap(), "gen 1");
        assert_eq!(fs::read_to_string(target.generation_path(3)).unwrap(), "gen 2");
        assert!(!target.generation_path(4).exists());
    }

    #[test]
    fn test_shift_with_gaps() {
        let temp = TempDir::new().unwrap();
        let target = SinkTarget::new(temp.path(), "app.log").unwrap();
        fs::write(target.generation_path(2), "gen 2").unwrap();

        let mut failures = Vec::new();
        shift_generations(&target, 5, &mut failures);

        assert!(failures.is_empty());
        assert!(!target.generation_path(2).exists());
        assert_eq!(fs::read_to_string(target.generation_path(3)).unwrap(), "gen 2");
    }
}
