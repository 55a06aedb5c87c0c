//! Performing a rotation.
//!
//! Callers must hold the sink lock for the whole call. Filesystem failures
//! are collected into the report rather than returned: the active file is
//! always recreated so the sink keeps accepting lines.

use std::fs;

use chrono::NaiveDate;

use super::archive::shift_generations;
use super::policy::{next_day, previous_day};
use super::{RotatingFile, RotationOutcome, RotationPolicy};
use crate::logging::writer::FileWriter;

/// Result of one executor run.
#[derive(Debug, Default)]
pub(crate) struct RotationReport {
    pub(crate) outcome: RotationOutcome,
    /// Human-readable filesystem failures, oldest first.
    pub(crate) failures: Vec<String>,
}

/// Swap the active file for a fresh one, archiving or discarding the old one.
pub(crate) fn rotate(file: &mut RotatingFile, today: NaiveDate) -> RotationReport {
    let mut failures = Vec::new();

    match &mut file.policy {
        RotationPolicy::ByDate { boundary, .. } => {
            let archive = file.target.dated_path(previous_day(*boundary));
            if archive.exists() {
                tracing::debug!(
                    archive = %archive.display(),
                    "archive already exists, skipping rotation"
                );
                return RotationReport {
                    outcome: RotationOutcome::Skipped,
                    failures,
                };
            }

            close_active(&mut file.writer, &mut failures);
            let active = file.target.active_path();
            if let Err(e) = fs::rename(active, &archive) {
                failures.push(format!(
                    "renaming {} to {}: {}",
                    active.display(),
                    archive.display(),
                    e
                ));
            }
            *boundary = next_day(today);
        }
        RotationPolicy::BySize {
            max_generations, ..
        } => {
            let max_generations = *max_generations;
            if max_generations == 1 {
                close_active(&mut file.writer, &mut failures);
                let active = file.target.active_path();
                if let Err(e) = fs::remove_file(active) {
                    failures.push(format!("removing {}: {}", active.display(), e));
                }
            } else {
                shift_generations(&file.target, max_generations, &mut failures);
                close_active(&mut file.writer, &mut failures);
                let active = file.target.active_path();
                let first = file.target.generation_path(1);
                if let Err(e) = fs::rename(active, &first) {
                    failures.push(format!(
                        "renaming {} to {}: {}",
                        active.display(),
                        first.display(),
                        e
                    ));
                }
            }
        }
    }

    if let Err(e) = file.writer.create_fresh() {
        failures.push(format!(
            "creating {}: {}",
            file.writer.path().display(),
            e
        ));
    }

    tracing::debug!(
        active = %file.target.active_path().display(),
        mode = %file.policy.mode(),
        failures = failures.len(),
        "rotated log file"
    );

    RotationReport {
        outcome: RotationOutcome::Rotated,
        failures,
    }
}

fn close_active(writer: &mut FileWriter, failures: &mut Vec<String>) {
    if let Err(e) = writer.close() {
        failures.push(format!("closing {}: {}", writer.path().display(), e));
    }
}
