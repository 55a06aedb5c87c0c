//! Severity levels and the threshold filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Message severity, ordered from most to least verbose.
///
/// `All` and `Off` only make sense as thresholds: `All` lets everything
/// through, `Off` silences the leveled writes entirely.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    All = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    #[default]
    Error = 4,
    Fatal = 5,
    Off = 6,
}

impl Level {
    /// Tag written into each line, e.g. `info`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::All => "all",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Off => "off",
        }
    }

    /// Whether a message at `self` passes a sink whose threshold is `threshold`.
    pub fn passes(self, threshold: Level) -> bool {
        threshold != Level::Off && self >= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Level::All),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "off" => Ok(Level::Off),
            other => Err(LogError::InvalidParameter(format!("unknown level '{}'", other))),
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = LogError;

    fn try_from(value: u8) -> Result<Self, LogError> {
        match value {
            0 => Ok(Level::All),
            1 => Ok(Level::Debug),
            2 => Ok(Level::Info),
            3 => Ok(Level::Warn),
            4 => Ok(Level::Error),
            5 => Ok(Level::Fatal),
            6 => Ok(Level::Off),
            other => Err(LogError::InvalidParameter(format!(
                "level {} out of range 0..=6",
                other
            ))),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}
