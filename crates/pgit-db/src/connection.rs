//! DuckDB-backed migration state store.
//!
//! [`DuckDbConnection`] owns a DuckDB [`Connection`] and keeps migration
//! state in two tables, created on first read:
//!
//! - `<prefix>_migrations`: one row per migration run
//! - `<prefix>_file_states`: one row per file per migration that touched it
//!
//! The newest row per path is the file's current version, so deleting the
//! row for a rolled-back migration falls back to the version recorded by the
//! migration before it.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use duckdb::Connection;
use pgit_core::config::is_valid_identifier;
use pgit_core::{
    CoreResult, DatabaseConnection, FileMigrationState, Migration, MigrationId, MigrationState,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Default prefix for the state tables.
pub const DEFAULT_TABLE_PREFIX: &str = "pgit";

/// Migration state stored in a DuckDB database
pub struct DuckDbConnection {
    conn: Mutex<Connection>,
    migrations_table: String,
    file_states_table: String,
    sequence: String,
}

impl DuckDbConnection {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path, table_prefix: &str) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Self::with_connection(conn, table_prefix)
    }

    /// Create an in-memory database
    pub fn in_memory(table_prefix: &str) -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn, table_prefix)
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str, table_prefix: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory(table_prefix)
        } else {
            Self::open(Path::new(path), table_prefix)
        }
    }

    fn with_connection(conn: Connection, table_prefix: &str) -> DbResult<Self> {
        if !is_valid_identifier(table_prefix) {
            return Err(DbError::InvalidTablePrefix(table_prefix.to_string()));
        }
        Ok(Self {
            conn: Mutex::new(conn),
            migrations_table: format!("{table_prefix}_migrations"),
            file_states_table: format!("{table_prefix}_file_states"),
            sequence: format!("{table_prefix}_migration_id_seq"),
        })
    }

    /// Name of the migrations table
    pub fn migrations_table(&self) -> &str {
        &self.migrations_table
    }

    /// Name of the file states table
    pub fn file_states_table(&self) -> &str {
        &self.file_states_table
    }

    /// Execute arbitrary SQL outside of any state bookkeeping.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Run a single-value query, mostly useful for inspecting applied schema.
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    fn transaction<F, T>(&self, body: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    fn ensure_tables(&self, conn: &Connection) -> DbResult<()> {
        let ddl = format!(
            "CREATE SEQUENCE IF NOT EXISTS {seq} START 1;
             CREATE TABLE IF NOT EXISTS {migrations} (
                 id         BIGINT PRIMARY KEY DEFAULT nextval('{seq}'),
                 completed  BOOLEAN NOT NULL DEFAULT false,
                 created_at TIMESTAMP NOT NULL
             );
             CREATE TABLE IF NOT EXISTS {file_states} (
                 path         VARCHAR NOT NULL,
                 migration_id BIGINT NOT NULL,
                 version      VARCHAR NOT NULL,
                 PRIMARY KEY (path, migration_id)
             );",
            seq = self.sequence,
            migrations = self.migrations_table,
            file_states = self.file_states_table,
        );
        conn.execute_batch(&ddl).map_err(|e| {
            DbError::ExecutionError(format!("failed to create migration state tables: {e}"))
        })
    }

    fn read_state(&self) -> DbResult<MigrationState> {
        let conn = self.lock()?;
        self.ensure_tables(&conn)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT path, version, migration_id FROM {}
             QUALIFY row_number() OVER (PARTITION BY path ORDER BY migration_id DESC) = 1
             ORDER BY path",
            self.file_states_table
        ))?;
        let file_states = stmt
            .query_map([], |row| {
                Ok(FileMigrationState {
                    path: row.get(0)?,
                    version: row.get(1)?,
                    migration: Some(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, completed, epoch_ms(created_at) FROM {} ORDER BY id DESC LIMIT 1",
            self.migrations_table
        ))?;
        let last_migration = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, MigrationId>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .next()
            .transpose()?
            .map(|(id, completed, created_ms)| migration_from_row(id, completed, created_ms));

        log::debug!(
            "Read {} file states from {}",
            file_states.len(),
            self.file_states_table
        );
        Ok(MigrationState::new(file_states, last_migration))
    }

    fn create_migration(&self) -> DbResult<Migration> {
        let conn = self.lock()?;
        let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        let (id, created_ms): (MigrationId, i64) = conn
            .query_row(
                &format!(
                    "INSERT INTO {} (completed, created_at) VALUES (false, CAST(? AS TIMESTAMP))
                     RETURNING id, epoch_ms(created_at)",
                    self.migrations_table
                ),
                duckdb::params![created_at],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| DbError::ExecutionError(format!("failed to create migration: {e}")))?;

        log::debug!("Created migration {id}");
        Ok(migration_from_row(id, false, created_ms))
    }

    fn apply_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> DbResult<()> {
        self.transaction(|conn| {
            execute_user_sql(conn, &file.path, sql)?;
            conn.execute(
                &format!(
                    "INSERT INTO {} (path, migration_id, version) VALUES (?, ?, ?)
                     ON CONFLICT (path, migration_id) DO UPDATE SET version = excluded.version",
                    self.file_states_table
                ),
                duckdb::params![file.path, migration.id, new_version],
            )
            .map_err(|e| {
                DbError::ExecutionError(format!("failed to record state for {}: {e}", file.path))
            })?;
            Ok(())
        })
    }

    fn rollback(
        &self,
        file: &FileMigrationState,
        sql: &str,
        migration: &Migration,
    ) -> DbResult<()> {
        self.transaction(|conn| {
            execute_user_sql(conn, &file.path, sql)?;
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE path = ? AND migration_id = ?",
                    self.file_states_table
                ),
                duckdb::params![file.path, migration.id],
            )
            .map_err(|e| {
                DbError::ExecutionError(format!("failed to clear state for {}: {e}", file.path))
            })?;
            Ok(())
        })
    }

    fn update_migration(&self, sql: String, migration: &Migration) -> DbResult<()> {
        let conn = self.lock()?;
        log::debug!("{sql} [id={}]", migration.id);
        conn.execute(&sql, duckdb::params![migration.id])?;
        Ok(())
    }

    fn migration_files(&self, migration: &Migration) -> DbResult<Vec<FileMigrationState>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT path, version, migration_id FROM {} WHERE migration_id = ? ORDER BY path",
            self.file_states_table
        ))?;
        let rows = stmt
            .query_map(duckdb::params![migration.id], |row| {
                Ok(FileMigrationState {
                    path: row.get(0)?,
                    version: row.get(1)?,
                    migration: Some(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Run schema-file SQL, skipping it entirely when there is nothing to run.
fn execute_user_sql(conn: &Connection, path: &str, sql: &str) -> DbResult<()> {
    if sql.trim().is_empty() {
        log::debug!("No SQL to execute for {path}");
        return Ok(());
    }
    log::debug!("Executing SQL for {path}:\n{sql}");
    conn.execute_batch(sql)
        .map_err(|e| DbError::ExecutionError(format!("{path}: {e}")))
}

fn migration_from_row(id: MigrationId, completed: bool, created_ms: i64) -> Migration {
    Migration {
        id,
        completed,
        created_at: DateTime::<Utc>::from_timestamp_millis(created_ms).unwrap_or_default(),
    }
}

impl DatabaseConnection for DuckDbConnection {
    fn read_migration_state(&self) -> CoreResult<MigrationState> {
        Ok(self.read_state()?)
    }

    fn create_new_migration(&self) -> CoreResult<Migration> {
        Ok(self.create_migration()?)
    }

    fn apply_and_update_state_for_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()> {
        Ok(self.apply_file(file, sql, new_version, migration)?)
    }

    fn rollback_file(
        &self,
        file: &FileMigrationState,
        sql: &str,
        _new_version: &str,
        migration: &Migration,
    ) -> CoreResult<()> {
        Ok(self.rollback(file, sql, migration)?)
    }

    fn finish_migration(&self, migration: &Migration) -> CoreResult<()> {
        let sql = format!(
            "UPDATE {} SET completed = true WHERE id = ?",
            self.migrations_table
        );
        Ok(self.update_migration(sql, migration)?)
    }

    fn remove_migration(&self, migration: &Migration) -> CoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.migrations_table);
        Ok(self.update_migration(sql, migration)?)
    }

    fn files_in_migration(&self, migration: &Migration) -> CoreResult<Vec<FileMigrationState>> {
        Ok(self.migration_files(migration)?)
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
