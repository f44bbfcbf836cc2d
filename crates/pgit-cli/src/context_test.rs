use super::*;
use std::fs;

fn args(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.display().to_string(),
        config: None,
        root: None,
        database: None,
        table_prefix: None,
    }
}

#[test]
fn resolve_config_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = resolve_config(&args(dir.path())).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn resolve_config_applies_table_prefix_override() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pgit.yml"), "state_table_prefix: from_file\n").unwrap();

    let mut global = args(dir.path());
    global.table_prefix = Some("from_flag".to_string());

    let config = resolve_config(&global).unwrap();
    assert_eq!(config.state_table_prefix, "from_flag");
}

#[test]
fn resolve_config_rejects_bad_table_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut global = args(dir.path());
    global.table_prefix = Some("bad-prefix".to_string());

    assert!(resolve_config(&global).is_err());
}

#[test]
fn resolve_config_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yml");
    fs::write(&path, "schema_dir: migrations\n").unwrap();

    let mut global = args(dir.path());
    global.config = Some(path.display().to_string());

    let config = resolve_config(&global).unwrap();
    assert_eq!(config.schema_dir, "migrations");
}

#[test]
fn context_requires_existing_schema_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut global = args(dir.path());
    global.root = Some(dir.path().join("missing").display().to_string());

    let err = RuntimeContext::new(&global).err().unwrap();
    assert!(err.to_string().contains("is not a directory"), "{err}");
}
