//! In-memory fakes for the collaborator traits.
//!
//! [`FakeVcs`] serves commit history and snapshots from maps, and
//! [`FakeDatabase`] keeps state rows in memory and records every call so
//! tests can assert on exactly what the migrator asked for.

use crate::error::{CoreError, CoreResult};
use crate::state::{FileMigrationState, Migration, MigrationId, MigrationState};
use crate::traits::{DatabaseConnection, VersionControl};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Deterministic 40-character commit id for tests.
pub fn commit_id(n: u32) -> String {
    format!("{n:040x}")
}

/// Version control backed by in-memory history.
#[derive(Debug, Default)]
pub struct FakeVcs {
    root: PathBuf,
    dirty: HashSet<String>,
    history: HashMap<String, Vec<String>>,
    snapshots: HashMap<(String, String), String>,
}

impl FakeVcs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Record a commit of `path` with `content`; it becomes the newest entry.
    pub fn commit(&mut self, path: &str, commit: &str, content: &str) -> &mut Self {
        self.history
            .entry(path.to_string())
            .or_default()
            .insert(0, commit.to_string());
        self.snapshots
            .insert((commit.to_string(), path.to_string()), content.to_string());
        self.dirty.remove(path);
        self
    }

    /// Mark `path` as having local modifications.
    pub fn set_dirty(&mut self, path: &str) -> &mut Self {
        self.dirty.insert(path.to_string());
        self
    }
}

impl VersionControl for FakeVcs {
    fn repository_root(&self) -> CoreResult<PathBuf> {
        Ok(self.root.clone())
    }

    fn is_dirty(&self, path: &str) -> CoreResult<bool> {
        Ok(self.dirty.contains(path))
    }

    fn history(&self, path: &str) -> CoreResult<Vec<String>> {
        Ok(self.history.get(path).cloned().unwrap_or_default())
    }

    fn content_at(&self, commit: &str, path: &str) -> CoreResult<Vec<u8>> {
        self.snapshots
            .get(&(commit.to_string(), path.to_string()))
            .map(|content| content.clone().into_bytes())
            .ok_or_else(|| {
                CoreError::Vcs(format!("path '{path}' does not exist in '{commit}'"))
            })
    }
}

/// One recorded call against [`FakeDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCall {
    ReadMigrationState,
    CreateNewMigration,
    ApplyFile {
        path: String,
        sql: String,
        new_version: String,
        migration: MigrationId,
    },
    RollbackFile {
        path: String,
        sql: String,
        new_version: String,
        migration: MigrationId,
    },
    FinishMigration(MigrationId),
    RemoveMigration(MigrationId),
    FilesInMigration(MigrationId),
}

impl DbCall {
    /// Whether the call would write to a real store.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            DbCall::ReadMigrationState | DbCall::FilesInMigration(_)
        )
    }
}

#[derive(Debug, Default)]
struct FakeDbInner {
    migrations: Vec<Migration>,
    rows: Vec<FileMigrationState>,
    next_id: MigrationId,
    calls: Vec<DbCall>,
    fail_apply: HashSet<String>,
    fail_rollback: HashSet<String>,
}

/// State store held in memory, keyed by `(path, migration)` like the real one.
#[derive(Debug, Default)]
pub struct FakeDatabase {
    inner: RefCell<FakeDbInner>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `apply_and_update_state_for_file` fail for `path`.
    pub fn fail_apply_for(&self, path: &str) {
        self.inner.borrow_mut().fail_apply.insert(path.to_string());
    }

    /// Make `rollback_file` fail for `path`.
    pub fn fail_rollback_for(&self, path: &str) {
        self.inner.borrow_mut().fail_rollback.insert(path.to_string());
    }

    /// Insert a migration with file rows directly, bypassing call recording.
    pub fn seed_migration(&self, completed: bool, files: &[(&str, &str)]) -> Migration {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let mut migration = Migration::new(inner.next_id);
        migration.completed = completed;
        for (path, version) in files {
            inner.rows.push(FileMigrationState {
                path: path.to_string(),
                version: version.to_string(),
                migration: Some(migration.id),
            });
        }
        inner.migrations.push(migration.clone());
        migration
    }

    pub fn calls(&self) -> Vec<DbCall> {
        self.inner.borrow().calls.clone()
    }

    /// Recorded calls that would write to a real store.
    pub fn writes(&self) -> Vec<DbCall> {
        self.calls().into_iter().filter(DbCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn migrations(&self) -> Vec<Migration> {
        self.inner.borrow().migrations.clone()
    }

    /// Every stored file row, including superseded ones.
    pub fn file_rows(&self) -> Vec<FileMigrationState> {
        self.inner.borrow().rows.clone()
    }

    fn record(&self, call: DbCall) {
        self.inner.borrow_mut().calls.push(call);
    }
}

impl DatabaseConnection for FakeDatabase {
    fn read_migration_state(&self) -> CoreResult<MigrationState> {
        self.record(DbCall::ReadMigrationState);
        let inner = self.inner.borrow();

        let mut latest: HashMap<&str, &FileMigrationState> = HashMap::new();
        for row in &inner.rows {
            match latest.get(row.path.as_str()) {
                Some(existing) if existing.migration >= row.migration => {}
                _ => {
                    latest.insert(row.path.as_str(), row);
                }
            }
        }

        let last_migration = inner.migrations.iter().max_by_key(|m| m.id).cloned();
        Ok(MigrationState::new(
            latest.into_values().cloned(),
            last_migration,
        ))
    }

    fn create_new_migration(&self) -> CoreResult<Migration> {
        self.record(DbCall::CreateNewMigration);
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let migration = Migration::new(inner.next_id);
        inner.migrations.push(migration.clone());
        Ok(migration)
    }

    fn apply_and_update_state_for_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()> {
        self.record(DbCall::ApplyFile {
            path: file.path.clone(),
            sql: sql.to_string(),
            new_version: new_version.to_string(),
            migration: migration.id,
        });

        let mut inner = self.inner.borrow_mut();
        if inner.fail_apply.contains(&file.path) {
            return Err(CoreError::State(format!(
                "simulated apply failure for {}",
                file.path
            )));
        }

        if let Some(row) = inner
            .rows
            .iter_mut()
            .find(|row| row.path == file.path && row.migration == Some(migration.id))
        {
            row.version = new_version.to_string();
            return Ok(());
        }

        inner.rows.push(FileMigrationState {
            path: file.path.clone(),
            version: new_version.to_string(),
            migration: Some(migration.id),
        });
        Ok(())
    }

    fn rollback_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()> {
        self.record(DbCall::RollbackFile {
            path: file.path.clone(),
            sql: sql.to_string(),
            new_version: new_version.to_string(),
            migration: migration.id,
        });

        let mut inner = self.inner.borrow_mut();
        if inner.fail_rollback.contains(&file.path) {
            return Err(CoreError::State(format!(
                "simulated rollback failure for {}",
                file.path
            )));
        }

        inner
            .rows
            .retain(|row| !(row.path == file.path && row.migration == Some(migration.id)));
        Ok(())
    }

    fn finish_migration(&self, migration: &Migration) -> CoreResult<()> {
        self.record(DbCall::FinishMigration(migration.id));
        let mut inner = self.inner.borrow_mut();
        if let Some(m) = inner.migrations.iter_mut().find(|m| m.id == migration.id) {
            m.completed = true;
        }
        Ok(())
    }

    fn remove_migration(&self, migration: &Migration) -> CoreResult<()> {
        self.record(DbCall::RemoveMigration(migration.id));
        self.inner
            .borrow_mut()
            .migrations
            .retain(|m| m.id != migration.id);
        Ok(())
    }

    fn files_in_migration(&self, migration: &Migration) -> CoreResult<Vec<FileMigrationState>> {
        self.record(DbCall::FilesInMigration(migration.id));
        Ok(self
            .inner
            .borrow()
            .rows
            .iter()
            .filter(|row| row.migration == Some(migration.id))
            .cloned()
            .collect())
    }
}
