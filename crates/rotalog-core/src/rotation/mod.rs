//! Rotation engine: when to rotate, how to rotate, and the background
//! thread that checks even when nobody writes.

pub mod archive;
pub(crate) mod executor;
pub(crate) mod monitor;
pub mod policy;

pub use archive::{ArchiveKind, SinkTarget, DATE_FORMAT};
pub use policy::{RotationMode, RotationPolicy, SizeUnit};

use crate::logging::writer::FileWriter;

/// What a rotation check or forced rotation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOutcome {
    /// The policy did not call for a rotation.
    #[default]
    NotDue,
    /// The active file was archived or discarded and a fresh one opened.
    Rotated,
    /// The dated archive name was already taken; nothing changed.
    Skipped,
}

/// A configured sink's file together with its rotation settings.
#[derive(Debug)]
pub(crate) struct RotatingFile {
    pub(crate) target: SinkTarget,
    pub(crate) policy: RotationPolicy,
    pub(crate) writer: FileWriter,
}
