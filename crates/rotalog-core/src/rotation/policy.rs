//! Deciding when a rotation is due.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};

/// Multiplier applied to a size threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    KB,
    #[default]
    MB,
    GB,
    TB,
}

impl SizeUnit {
    pub fn bytes(self) -> u64 {
        match self {
            SizeUnit::KB => 1 << 10,
            SizeUnit::MB => 1 << 20,
            SizeUnit::GB => 1 << 30,
            SizeUnit::TB => 1 << 40,
        }
    }
}

impl FromStr for SizeUnit {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KB" | "K" => Ok(SizeUnit::KB),
            "MB" | "M" => Ok(SizeUnit::MB),
            "GB" | "G" => Ok(SizeUnit::GB),
            "TB" | "T" => Ok(SizeUnit::TB),
            other => Err(LogError::InvalidParameter(format!(
                "unknown size unit '{}'",
                other
            ))),
        }
    }
}

/// Which rotation scheme a sink uses. Fixed by the first successful
/// configuration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationMode {
    Unset,
    BySize,
    ByDate,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RotationMode::Unset => "no",
            RotationMode::BySize => "size",
            RotationMode::ByDate => "date",
        })
    }
}

/// Thresholds and retention for a configured sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationPolicy {
    BySize {
        max_bytes: u64,
        max_generations: u32,
    },
    ByDate {
        /// First day that does not belong to the active file.
        boundary: NaiveDate,
        /// Recorded only; the cadence is always one day.
        interval_days: u32,
    },
}

impl RotationPolicy {
    /// Size rotation at `max_size * unit` bytes, keeping `max_generations`
    /// archives.
    pub fn by_size(max_size: u64, max_generations: u32, unit: SizeUnit) -> LogResult<Self> {
        if max_size == 0 {
            return Err(LogError::InvalidParameter("max_size must be non-zero".into()));
        }
        if max_generations == 0 {
            return Err(LogError::InvalidParameter(
                "max_generations must be non-zero".into(),
            ));
        }
        let max_bytes = max_size.checked_mul(unit.bytes()).ok_or_else(|| {
            LogError::InvalidParameter(format!("{} {:?} overflows a byte count", max_size, unit))
        })?;
        Ok(RotationPolicy::BySize {
            max_bytes,
            max_generations,
        })
    }

    /// Daily rotation; the first boundary is the day after `today`.
    pub fn by_date(today: NaiveDate, interval_days: u32) -> LogResult<Self> {
        if interval_days == 0 {
            return Err(LogError::InvalidParameter(
                "interval_days must be non-zero".into(),
            ));
        }
        Ok(RotationPolicy::ByDate {
            boundary: next_day(today),
            interval_days,
        })
    }

    pub fn mode(&self) -> RotationMode {
        match self {
            RotationPolicy::BySize { .. } => RotationMode::BySize,
            RotationPolicy::ByDate { .. } => RotationMode::ByDate,
        }
    }

    /// Whether the active file at `active` must be rotated now.
    ///
    /// Date mode is due from the boundary day itself, so the first check after
    /// midnight rotates even if several days were missed.
    pub fn should_rotate(&self, active: &Path, today: NaiveDate) -> bool {
        match self {
            RotationPolicy::BySize { max_bytes, .. } => file_size(active) >= *max_bytes,
            RotationPolicy::ByDate { boundary, .. } => today >= *boundary,
        }
    }
}

/// Size of `path` in bytes; 0 when it cannot be stat'ed.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

pub(crate) fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(day)
}

pub(crate) fn previous_day(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(1)).unwrap_or(day)
}
