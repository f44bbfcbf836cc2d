use super::*;

#[test]
fn test_untracked_file_has_empty_version() {
    let state = MigrationState::default();
    let file = state.file_state("schema/users.sql");
    assert_eq!(file.path, "schema/users.sql");
    assert_eq!(file.version, "");
    assert!(!file.is_tracked());
}

#[test]
fn test_tracked_file_state_is_returned() {
    let state = MigrationState::new(
        vec![FileMigrationState {
            path: "schema/users.sql".to_string(),
            version: "3".to_string(),
            migration: Some(7),
        }],
        Some(Migration::new(7)),
    );

    let file = state.file_state("schema/users.sql");
    assert_eq!(file.version, "3");
    assert_eq!(file.migration, Some(7));
    assert!(file.is_tracked());
    assert_eq!(state.last_migration.as_ref().map(|m| m.id), Some(7));
}

#[test]
fn test_duplicate_paths_keep_last_row() {
    let state = MigrationState::new(
        vec![
            FileMigrationState {
                path: "a.sql".to_string(),
                version: "1".to_string(),
                migration: Some(1),
            },
            FileMigrationState {
                path: "a.sql".to_string(),
                version: "2".to_string(),
                migration: Some(2),
            },
        ],
        None,
    );

    assert_eq!(state.file_states.len(), 1);
    assert_eq!(state.file_state("a.sql").version, "2");
}

#[test]
fn test_new_migration_is_incomplete() {
    let migration = Migration::new(42);
    assert_eq!(migration.id, 42);
    assert!(!migration.completed);
}
