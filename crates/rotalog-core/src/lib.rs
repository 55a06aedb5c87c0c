//! Rotalog Core Library
//!
//! Leveled file logging with size- and date-based rotation.
//!
//! ## Overview
//!
//! A [`Sink`] writes timestamped lines, tagged with the caller's file and
//! line, to one active file and optionally mirrors them to the console. It
//! rotates that file in one of two modes, fixed once per sink:
//!
//! - **By size**: once the file reaches a byte threshold it becomes
//!   `<base>.1`, older archives shift up to `<base>.<max_generations>`, and
//!   the oldest is discarded.
//! - **By date**: at the first check on a new calendar day the file becomes
//!   `<base>.YYYY-MM-DD`, named after the day it covers.
//!
//! Rotation is checked before every write and by a background monitor
//! thread, so idle sinks roll over too.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rotalog_core::{Level, Sink, SizeUnit};
//!
//! fn main() -> Result<(), rotalog_core::LogError> {
//!     let sink = Sink::builder().level(Level::Info).build();
//!     sink.rotate_by_size("./logs", "app.log", 10, 5, SizeUnit::MB)?;
//!
//!     rotalog_core::info!(sink, "starting with {} workers", 4);
//!     rotalog_core::error!(sink, "upstream unreachable");
//!
//!     sink.close();
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod inventory;
pub mod level;
pub mod logging;
mod macros;
pub mod rotation;
pub mod sink;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RotationConfig, SinkConfig};
pub use error::{LogError, LogResult};
pub use inventory::{Inventory, InventoryEntry, LevelStats};
pub use level::Level;
pub use logging::{LogLine, SinkLayer};
pub use rotation::monitor::DEFAULT_MONITOR_INTERVAL;
pub use rotation::{
    ArchiveKind, RotationMode, RotationOutcome, RotationPolicy, SinkTarget, SizeUnit,
};
pub use sink::{Sink, SinkBuilder};
