//! Reports returned by the migrator.

use crate::state::Migration;
use serde::Serialize;

/// A file that moved from one version to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub from_version: String,
    pub to_version: String,
}

/// A file the run skipped, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub version: String,
    pub reason: String,
}

/// Outcome of [`crate::Migrator::apply_latest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Migration created for this run; `None` when nothing changed
    pub migration: Option<Migration>,
    pub applied: Vec<FileChange>,
    pub skipped: Vec<SkippedFile>,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.migration.is_none()
    }
}

/// Outcome of a successful [`crate::Migrator::rollback`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    /// Migration that was rolled back and removed; `None` if there was none
    pub migration: Option<Migration>,
    pub rolled_back: Vec<FileChange>,
    pub skipped: Vec<SkippedFile>,
}

/// What `apply_latest` would do to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    UpToDate,
    Pending { version: String, sql: String },
    Error { reason: String },
}

/// One row of [`crate::Migrator::plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub path: String,
    pub current_version: String,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}
