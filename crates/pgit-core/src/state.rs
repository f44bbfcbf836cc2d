//! Persisted migration state: migration batches and per-file versions.
//!
//! These rows are the only state that survives between runs. They are read
//! and written exclusively through [`crate::DatabaseConnection`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Identifier assigned to a migration batch by the state store.
pub type MigrationId = i64;

/// A batch of file changes made by one `apply_latest` run.
///
/// `completed` only becomes true after every file scheduled in the batch has
/// been processed; an incomplete migration marks an interrupted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Store-assigned identifier
    pub id: MigrationId,

    /// Whether the run that created this migration finished
    pub completed: bool,

    /// When the migration row was created
    pub created_at: DateTime<Utc>,
}

impl Migration {
    /// Create a fresh, incomplete migration record.
    pub fn new(id: MigrationId) -> Self {
        Self {
            id,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// Last-applied version of one schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMigrationState {
    /// Path of the file, relative to the repository root
    pub path: String,

    /// Dialect-specific version string; empty means never applied
    pub version: String,

    /// Migration that last touched this file, `None` when untracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationId>,
}

impl FileMigrationState {
    /// State for a file that has never been applied.
    pub fn untracked(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: String::new(),
            migration: None,
        }
    }

    /// Whether this state was loaded from the store.
    pub fn is_tracked(&self) -> bool {
        self.migration.is_some()
    }
}

/// The complete persisted view loaded at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationState {
    /// Current state of each tracked file, keyed by path
    pub file_states: BTreeMap<String, FileMigrationState>,

    /// Most recently created migration, completed or not
    pub last_migration: Option<Migration>,
}

impl MigrationState {
    /// Build a state view from loaded rows.
    pub fn new(
        states: impl IntoIterator<Item = FileMigrationState>,
        last_migration: Option<Migration>,
    ) -> Self {
        Self {
            file_states: states.into_iter().map(|s| (s.path.clone(), s)).collect(),
            last_migration,
        }
    }

    /// State of `path`, or an untracked default when the file was never applied.
    pub fn file_state(&self, path: &str) -> FileMigrationState {
        self.file_states
            .get(path)
            .cloned()
            .unwrap_or_else(|| FileMigrationState::untracked(path))
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
