//! Collaborator traits injected into the migrator.
//!
//! The orchestration in [`crate::migrator`] never talks to a SQL driver or a
//! version-control binary directly; it goes through these two seams.

use crate::error::CoreResult;
use crate::state::{FileMigrationState, Migration, MigrationState};
use std::path::PathBuf;

/// Persistent store for migration state.
///
/// `apply_and_update_state_for_file` and `rollback_file` must each be atomic:
/// the SQL and the state-row write commit or fail together.
pub trait DatabaseConnection {
    /// Load every file state and the most recent migration, creating the
    /// backing tables when they do not exist yet.
    fn read_migration_state(&self) -> CoreResult<MigrationState>;

    /// Create a new, incomplete migration with a fresh id.
    fn create_new_migration(&self) -> CoreResult<Migration>;

    /// Execute `sql`, then upsert the file's state row tagged with `migration`.
    fn apply_and_update_state_for_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()>;

    /// Execute `sql`, then delete the file's state row for `migration`.
    fn rollback_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()>;

    /// Mark `migration` as completed.
    fn finish_migration(&self, migration: &Migration) -> CoreResult<()>;

    /// Delete the migration row.
    fn remove_migration(&self, migration: &Migration) -> CoreResult<()>;

    /// File states recorded under `migration`.
    fn files_in_migration(&self, migration: &Migration) -> CoreResult<Vec<FileMigrationState>>;
}

/// Version-control queries needed by definition files.
///
/// All `path` arguments are relative to [`VersionControl::repository_root`],
/// using `/` as the separator.
pub trait VersionControl {
    /// Absolute path of the repository working tree.
    fn repository_root(&self) -> CoreResult<PathBuf>;

    /// True if the file has uncommitted local modifications (or is untracked).
    fn is_dirty(&self, path: &str) -> CoreResult<bool>;

    /// Commits that touched the file, newest first, following renames.
    fn history(&self, path: &str) -> CoreResult<Vec<String>>;

    /// Content of the file as of `commit`.
    fn content_at(&self, commit: &str, path: &str) -> CoreResult<Vec<u8>>;
}
