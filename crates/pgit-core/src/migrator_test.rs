use super::*;
use crate::test_utils::{commit_id, DbCall, FakeDatabase, FakeVcs};
use std::fs;
use tempfile::TempDir;

const USERS_V1: &str = "-- pgit type=changeset
-- change
CREATE TABLE users (id int);
-- rollback
DROP TABLE users;
";

const USERS_V2: &str = "-- pgit type=changeset
-- change
CREATE TABLE users (id int);
-- rollback
DROP TABLE users;
-- change
ALTER TABLE users ADD COLUMN name text;
-- rollback
ALTER TABLE users DROP COLUMN name;
";

const ORDERS: &str = "-- pgit type=changeset
-- change
CREATE TABLE orders (id int);
-- rollback
DROP TABLE orders;
";

const VIEW_V1: &str = "-- pgit type=definition
-- definition
CREATE VIEW active_users AS SELECT 1;
-- rollback
DROP VIEW active_users;
";

const VIEW_V2: &str = "-- pgit type=definition
-- definition
CREATE VIEW active_users AS SELECT 2;
-- rollback
DROP VIEW active_users;
";

struct Fixture {
    repo: TempDir,
    vcs: FakeVcs,
    db: FakeDatabase,
}

impl Fixture {
    fn new() -> Self {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir_all(repo.path().join("schema")).unwrap();
        let vcs = FakeVcs::new(repo.path());
        Self {
            repo,
            vcs,
            db: FakeDatabase::new(),
        }
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.repo.path().join("schema").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self.repo.path().join("schema"), &self.vcs)
    }

    fn version_of(&self, path: &str) -> String {
        self.db
            .read_migration_state()
            .unwrap()
            .file_state(path)
            .version
    }
}

#[test]
fn test_apply_with_no_files_creates_no_migration() {
    let fx = Fixture::new();

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    assert!(report.is_noop());
    assert!(report.applied.is_empty());
    assert!(fx.db.writes().is_empty());
    assert!(fx.db.migrations().is_empty());
}

#[test]
fn test_apply_new_changeset() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    let migration = report.migration.clone().unwrap();
    assert!(migration.completed);
    assert_eq!(
        fx.db.writes(),
        vec![
            DbCall::CreateNewMigration,
            DbCall::ApplyFile {
                path: "schema/users.sql".to_string(),
                sql: "CREATE TABLE users (id int);\n\n".to_string(),
                new_version: "1".to_string(),
                migration: migration.id,
            },
            DbCall::FinishMigration(migration.id),
        ]
    );
    assert_eq!(
        report.applied,
        vec![FileChange {
            path: "schema/users.sql".to_string(),
            from_version: String::new(),
            to_version: "1".to_string(),
        }]
    );
    assert_eq!(fx.version_of("schema/users.sql"), "1");
    assert!(fx.db.migrations()[0].completed);
}

#[test]
fn test_second_apply_is_a_noop() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    fx.write("orders.sql", ORDERS);

    fx.migrator().apply_latest(&fx.db).unwrap();
    fx.db.clear_calls();

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    assert!(report.is_noop());
    assert!(fx.db.writes().is_empty());
    assert_eq!(fx.db.migrations().len(), 1);
}

#[test]
fn test_multiple_files_share_one_migration() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    fx.write("orders.sql", ORDERS);

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    let creates = fx
        .db
        .calls()
        .into_iter()
        .filter(|c| *c == DbCall::CreateNewMigration)
        .count();
    assert_eq!(creates, 1);

    let paths: Vec<&str> = report.applied.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["schema/orders.sql", "schema/users.sql"]);
}

#[test]
fn test_apply_appended_changeset_only_runs_new_block() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    fx.migrator().apply_latest(&fx.db).unwrap();

    fx.write("users.sql", USERS_V2);
    fx.db.clear_calls();
    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    let migration = report.migration.unwrap();
    assert!(fx.db.writes().contains(&DbCall::ApplyFile {
        path: "schema/users.sql".to_string(),
        sql: "ALTER TABLE users ADD COLUMN name text;\n\n".to_string(),
        new_version: "2".to_string(),
        migration: migration.id,
    }));
    assert_eq!(fx.version_of("schema/users.sql"), "2");
}

#[test]
fn test_apply_failure_skips_file_and_continues() {
    let fx = Fixture::new();
    fx.write("orders.sql", ORDERS);
    fx.write("users.sql", USERS_V1);
    fx.db.fail_apply_for("schema/orders.sql");

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "schema/orders.sql");
    assert!(report.skipped[0].reason.contains("simulated apply failure"));
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.applied[0].path, "schema/users.sql");
    assert!(report.migration.unwrap().completed);

    assert_eq!(fx.version_of("schema/orders.sql"), "");
    assert_eq!(fx.version_of("schema/users.sql"), "1");
}

#[test]
fn test_sql_error_skips_file_without_creating_migration() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    fx.db.seed_migration(true, &[("schema/users.sql", "5")]);

    let report = fx.migrator().apply_latest(&fx.db).unwrap();

    assert!(report.is_noop());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].version, "5");
    assert!(fx.db.writes().is_empty());
}

#[test]
fn test_apply_definition_tracks_commit() {
    let mut fx = Fixture::new();
    fx.write("views/active_users.sql", VIEW_V1);
    fx.vcs
        .commit("schema/views/active_users.sql", &commit_id(1), VIEW_V1);

    let report = fx.migrator().apply_latest(&fx.db).unwrap();
    assert_eq!(report.applied[0].to_version, commit_id(1));

    fx.write("views/active_users.sql", VIEW_V2);
    fx.vcs
        .commit("schema/views/active_users.sql", &commit_id(2), VIEW_V2);
    fx.db.clear_calls();

    let report = fx.migrator().apply_latest(&fx.db).unwrap();
    let migration = report.migration.unwrap();
    assert!(fx.db.writes().contains(&DbCall::ApplyFile {
        path: "schema/views/active_users.sql".to_string(),
        sql: "DROP VIEW active_users;\nCREATE VIEW active_users AS SELECT 2;".to_string(),
        new_version: commit_id(2),
        migration: migration.id,
    }));
}

#[test]
fn test_rollback_with_no_migrations() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);

    let report = fx.migrator().rollback(&fx.db).unwrap();

    assert!(report.migration.is_none());
    assert!(report.rolled_back.is_empty());
    assert!(fx.db.writes().is_empty());
}

#[test]
fn test_rollback_removes_latest_migration() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    let applied = fx.migrator().apply_latest(&fx.db).unwrap();
    let migration_id = applied.migration.unwrap().id;
    fx.db.clear_calls();

    let report = fx.migrator().rollback(&fx.db).unwrap();

    assert_eq!(
        fx.db.writes(),
        vec![
            DbCall::RollbackFile {
                path: "schema/users.sql".to_string(),
                sql: "DROP TABLE users;\n\n".to_string(),
                new_version: "0".to_string(),
                migration: migration_id,
            },
            DbCall::RemoveMigration(migration_id),
        ]
    );
    assert_eq!(report.rolled_back.len(), 1);
    assert_eq!(report.rolled_back[0].to_version, "0");
    assert!(fx.db.migrations().is_empty());
    assert!(fx.db.file_rows().is_empty());
}

#[test]
fn test_rollback_restores_previous_version() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    fx.migrator().apply_latest(&fx.db).unwrap();
    fx.write("users.sql", USERS_V2);
    fx.migrator().apply_latest(&fx.db).unwrap();
    assert_eq!(fx.version_of("schema/users.sql"), "2");

    let report = fx.migrator().rollback(&fx.db).unwrap();

    assert_eq!(report.rolled_back[0].from_version, "2");
    assert_eq!(report.rolled_back[0].to_version, "1");
    assert_eq!(fx.version_of("schema/users.sql"), "1");
    assert_eq!(fx.db.migrations().len(), 1);
}

#[test]
fn test_rollback_failure_keeps_migration() {
    let fx = Fixture::new();
    fx.write("orders.sql", ORDERS);
    fx.write("users.sql", USERS_V1);
    let migration = fx.migrator().apply_latest(&fx.db).unwrap().migration.unwrap();
    fx.db.fail_rollback_for("schema/orders.sql");
    fx.db.clear_calls();

    let err = fx.migrator().rollback(&fx.db).unwrap_err();

    assert!(err.to_string().contains("simulated rollback failure"), "{err}");
    let writes = fx.db.writes();
    assert_eq!(writes.len(), 1, "stops at first failure: {writes:?}");
    assert!(!writes.contains(&DbCall::RemoveMigration(migration.id)));
    assert_eq!(fx.db.migrations().len(), 1);
    assert_eq!(fx.version_of("schema/users.sql"), "1");
}

#[test]
fn test_rollback_skips_file_missing_from_disk() {
    let fx = Fixture::new();
    fx.write("users.sql", USERS_V1);
    let migration = fx
        .db
        .seed_migration(true, &[("schema/gone.sql", "1"), ("schema/users.sql", "1")]);

    let report = fx.migrator().rollback(&fx.db).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "schema/gone.sql");
    assert_eq!(report.rolled_back.len(), 1);
    assert!(fx
        .db
        .writes()
        .contains(&DbCall::RemoveMigration(migration.id)));
}

#[test]
fn test_rollback_definition_to_previous_commit() {
    let mut fx = Fixture::new();
    let path = "schema/views/active_users.sql";
    fx.vcs.commit(path, &commit_id(1), VIEW_V1);
    fx.vcs.commit(path, &commit_id(2), VIEW_V2);
    fx.write("views/active_users.sql", VIEW_V2);
    fx.db.seed_migration(true, &[(path, &commit_id(1))]);
    let migration = fx.db.seed_migration(true, &[(path, &commit_id(2))]);

    let report = fx.migrator().rollback(&fx.db).unwrap();

    assert_eq!(report.rolled_back[0].to_version, commit_id(1));
    assert!(fx.db.writes().contains(&DbCall::RollbackFile {
        path: path.to_string(),
        sql: "DROP VIEW active_users;\nCREATE VIEW active_users AS SELECT 1;".to_string(),
        new_version: commit_id(1),
        migration: migration.id,
    }));
    assert_eq!(fx.version_of(path), commit_id(1));
}

#[test]
fn test_plan_reports_without_writing() {
    let fx = Fixture::new();
    fx.write("orders.sql", ORDERS);
    fx.write("users.sql", USERS_V1);
    fx.write("views/broken.sql", "-- pgit type=definition\n-- definition\nSELECT 1;\n");
    fx.db.seed_migration(true, &[("schema/orders.sql", "1")]);

    let plan = fx.migrator().plan(&fx.db).unwrap();

    assert!(fx.db.writes().is_empty());
    assert_eq!(plan.len(), 3);
    assert_eq!(plan[0].path, "schema/orders.sql");
    assert_eq!(plan[0].outcome, PlanOutcome::UpToDate);
    assert_eq!(plan[1].path, "schema/users.sql");
    assert_eq!(
        plan[1].outcome,
        PlanOutcome::Pending {
            version: "1".to_string(),
            sql: "CREATE TABLE users (id int);\n\n".to_string(),
        }
    );
    assert!(matches!(plan[2].outcome, PlanOutcome::Error { .. }));
}

#[test]
fn test_load_error_aborts_run() {
    let fx = Fixture::new();
    fx.write("bad.sql", "CREATE TABLE t (id int);\n");

    let err = fx.migrator().apply_latest(&fx.db).unwrap_err();

    assert!(matches!(err, CoreError::Parse { .. }), "got {err:?}");
    assert!(fx.db.calls().is_empty());
}
