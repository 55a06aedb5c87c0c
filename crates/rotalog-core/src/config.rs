//! JSON sink configuration.
//!
//! ```json
//! {
//!   "level": "info",
//!   "console": false,
//!   "rotation": {
//!     "by_size": { "dir": "./logs", "base": "app.log", "max_size": 10, "max_generations": 5, "unit": "MB" }
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};
use crate::level::Level;
use crate::rotation::{RotationOutcome, SizeUnit};
use crate::sink::Sink;

/// Everything needed to build a configured [`Sink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub level: Level,
    #[serde(default = "default_console")]
    pub console: bool,
    pub rotation: RotationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationConfig {
    BySize {
        dir: PathBuf,
        base: String,
        max_size: u64,
        max_generations: u32,
        #[serde(default)]
        unit: SizeUnit,
    },
    ByDate {
        dir: PathBuf,
        base: String,
        #[serde(default = "default_interval_days")]
        interval_days: u32,
    },
}

fn default_console() -> bool {
    true
}

fn default_interval_days() -> u32 {
    1
}

impl SinkConfig {
    pub fn new(rotation: RotationConfig) -> Self {
        Self {
            level: Level::default(),
            console: default_console(),
            rotation,
        }
    }

    pub fn from_json_str(json: &str) -> LogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| LogError::io(format!("reading {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> LogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply this configuration to an existing sink.
    ///
    /// Level and console settings are applied first, so they stick even if
    /// the rotation mode is rejected. The outcome tells whether the existing
    /// active file was rotated during configuration.
    pub fn apply(&self, sink: &Sink) -> LogResult<RotationOutcome> {
        sink.set_level(self.level);
        sink.set_console(self.console);
        sink.configure_rotation(&self.rotation)
    }
}
