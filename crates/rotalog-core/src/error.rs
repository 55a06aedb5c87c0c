//! Error types for rotalog

use std::fmt;
use std::io;

use thiserror::Error;

use crate::rotation::RotationMode;

/// Main error type for sink configuration and the internal write path
#[derive(Error, Debug)]
pub enum LogError {
    /// A configuration parameter was empty, zero or out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A rotation mode has already been fixed for this sink
    #[error("Sink already configured for {0} rotation")]
    AlreadyConfigured(RotationMode),

    /// The sink has no rotation mode yet
    #[error("Sink is not configured")]
    NotConfigured,

    /// The sink was closed
    #[error("Sink is closed")]
    Closed,

    /// Filesystem error, with what was being attempted
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Malformed JSON configuration
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// A `Display` impl in a log message returned an error
    #[error("Format error: message could not be rendered")]
    Format(#[from] fmt::Error),
}

impl LogError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;
