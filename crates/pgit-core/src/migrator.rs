//! Migration orchestration.
//!
//! [`Migrator::apply_latest`] is best-effort: a file that fails to produce
//! or execute SQL is logged and skipped, and the remaining files still move
//! forward under one shared migration. [`Migrator::rollback`] is strict: it
//! stops at the first file whose rollback fails to execute and leaves the
//! migration row in place so the partial rollback stays visible.

use crate::directory::SchemaDirectory;
use crate::error::{CoreError, CoreResult};
use crate::report::{
    ApplyReport, FileChange, PlanOutcome, PlannedChange, RollbackReport, SkippedFile,
};
use crate::state::{FileMigrationState, Migration, MigrationState};
use crate::traits::{DatabaseConnection, VersionControl};
use std::path::{Path, PathBuf};

/// Applies and rolls back schema files under one root.
pub struct Migrator<'a> {
    schema_root: PathBuf,
    vcs: &'a dyn VersionControl,
}

impl<'a> Migrator<'a> {
    pub fn new(schema_root: impl Into<PathBuf>, vcs: &'a dyn VersionControl) -> Self {
        Self {
            schema_root: schema_root.into(),
            vcs,
        }
    }

    pub fn schema_root(&self) -> &Path {
        &self.schema_root
    }

    /// Bring every file up to its latest version.
    ///
    /// Files are visited in path order. A migration row is created lazily on
    /// the first real change and completed after the last file; a run with
    /// no changes writes nothing.
    pub fn apply_latest(&self, db: &dyn DatabaseConnection) -> CoreResult<ApplyReport> {
        let (schema, state) = self.load(db)?;
        let mut report = ApplyReport::default();
        let mut migration: Option<Migration> = None;

        for file in schema.files() {
            let file_state = state.file_state(file.path());

            let change = match file.apply_sql(&file_state.version, self.vcs) {
                Ok(change) => change,
                Err(e) => {
                    log::warn!(
                        "Failed to get SQL for applying update (file={} version={}): {}",
                        file.path(),
                        file_state.version,
                        e
                    );
                    report.skipped.push(skipped(&file_state, &e));
                    continue;
                }
            };

            if !change.changes_version(&file_state.version) {
                continue;
            }

            let current = match &migration {
                Some(m) => m,
                None => migration.insert(db.create_new_migration()?),
            };

            if let Err(e) =
                db.apply_and_update_state_for_file(&file_state, &change.sql, &change.version, current)
            {
                log::warn!(
                    "Unable to apply update for file (file={} version={}): {}",
                    file.path(),
                    change.version,
                    e
                );
                report.skipped.push(skipped(&file_state, &e));
                continue;
            }

            log::info!(
                "Applied {} ({} -> {})",
                file.path(),
                display_version(&file_state.version),
                display_version(&change.version)
            );
            report.applied.push(FileChange {
                path: file_state.path,
                from_version: file_state.version,
                to_version: change.version,
            });
        }

        if let Some(mut migration) = migration {
            db.finish_migration(&migration)?;
            migration.completed = true;
            report.migration = Some(migration);
        }

        Ok(report)
    }

    /// Roll back every file touched by the most recent migration, then
    /// remove that migration.
    ///
    /// A file whose rollback SQL cannot be computed is skipped. A file whose
    /// rollback fails to execute aborts the run with that error and the
    /// migration row is kept.
    pub fn rollback(&self, db: &dyn DatabaseConnection) -> CoreResult<RollbackReport> {
        let (schema, state) = self.load(db)?;
        let mut report = RollbackReport::default();

        let Some(migration) = state.last_migration else {
            log::info!("No migrations to roll back");
            return Ok(report);
        };

        for file_state in db.files_in_migration(&migration)? {
            let change = schema
                .get(&file_state.path)
                .ok_or_else(|| CoreError::FileNotLoaded {
                    path: file_state.path.clone(),
                })
                .and_then(|file| file.rollback_sql(&file_state.version, self.vcs));

            let change = match change {
                Ok(change) => change,
                Err(e) => {
                    log::warn!(
                        "Failed to get SQL for rolling back update (file={} version={}): {}",
                        file_state.path,
                        file_state.version,
                        e
                    );
                    report.skipped.push(skipped(&file_state, &e));
                    continue;
                }
            };

            if let Err(e) = db.rollback_file(&file_state, &change.sql, &change.version, &migration)
            {
                log::warn!(
                    "Unable to roll back file (file={} version={}): {}",
                    file_state.path,
                    change.version,
                    e
                );
                return Err(e);
            }

            log::info!(
                "Rolled back {} ({} -> {})",
                file_state.path,
                display_version(&file_state.version),
                display_version(&change.version)
            );
            report.rolled_back.push(FileChange {
                path: file_state.path,
                from_version: file_state.version,
                to_version: change.version,
            });
        }

        db.remove_migration(&migration)?;
        report.migration = Some(migration);
        Ok(report)
    }

    /// Compute what [`Migrator::apply_latest`] would do, without writing.
    pub fn plan(&self, db: &dyn DatabaseConnection) -> CoreResult<Vec<PlannedChange>> {
        let (schema, state) = self.load(db)?;

        Ok(schema
            .files()
            .map(|file| {
                let file_state = state.file_state(file.path());
                let outcome = match file.apply_sql(&file_state.version, self.vcs) {
                    Ok(change) if change.changes_version(&file_state.version) => {
                        PlanOutcome::Pending {
                            version: change.version,
                            sql: change.sql,
                        }
                    }
                    Ok(_) => PlanOutcome::UpToDate,
                    Err(e) => PlanOutcome::Error {
                        reason: e.to_string(),
                    },
                };
                PlannedChange {
                    path: file_state.path,
                    current_version: file_state.version,
                    outcome,
                }
            })
            .collect())
    }

    fn load(&self, db: &dyn DatabaseConnection) -> CoreResult<(SchemaDirectory, MigrationState)> {
        let schema = SchemaDirectory::load(&self.schema_root, self.vcs)?;
        let state = db.read_migration_state()?;
        Ok((schema, state))
    }
}

fn skipped(file_state: &FileMigrationState, error: &CoreError) -> SkippedFile {
    SkippedFile {
        path: file_state.path.clone(),
        version: file_state.version.clone(),
        reason: error.to_string(),
    }
}

fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "<none>"
    } else {
        version
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
