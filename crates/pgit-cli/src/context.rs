//! Runtime context for CLI commands

use anyhow::{bail, Context, Result};
use pgit_core::{Config, Migrator};
use pgit_db::DuckDbConnection;
use pgit_git::GitCli;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Runtime context containing resolved configuration, the git repository,
/// and the state database
pub struct RuntimeContext {
    /// Root of the schema files
    pub schema_root: PathBuf,

    /// Repository the schema files live in
    pub git: GitCli,

    /// Database connection
    pub db: DuckDbConnection,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project_path = Path::new(&args.project_dir);
        let config = resolve_config(args)?;

        let schema_root = match &args.root {
            Some(root) => PathBuf::from(root),
            None => config.schema_dir_absolute(project_path),
        };
        if !schema_root.is_dir() {
            bail!("Schema root '{}' is not a directory", schema_root.display());
        }

        let git = GitCli::discover(&schema_root).with_context(|| {
            format!(
                "Schema root '{}' is not inside a git repository",
                schema_root.display()
            )
        })?;

        let database = match &args.database {
            Some(db) => PathBuf::from(db),
            None => config.database_absolute(project_path).context(
                "No database configured: pass --database, set PGIT_DATABASE, or set `database` in pgit.yml",
            )?,
        };
        log::debug!("Using state database {}", database.display());

        let db = DuckDbConnection::new(&database.to_string_lossy(), &config.state_table_prefix)
            .with_context(|| format!("Failed to open database '{}'", database.display()))?;

        Ok(Self {
            schema_root,
            git,
            db,
        })
    }

    /// Migrator bound to this context's schema root and repository
    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(&self.schema_root, &self.git)
    }
}

/// Load config from a custom path or the project directory, then apply
/// command-line overrides that affect validation.
fn resolve_config(args: &GlobalArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            Config::load(Path::new(path)).context("Failed to load configuration file")?
        }
        None => Config::load_from_dir(Path::new(&args.project_dir))
            .context("Failed to load project configuration")?,
    };

    if let Some(prefix) = &args.table_prefix {
        config.state_table_prefix = prefix.clone();
        config.validate().context("Invalid --table-prefix")?;
    }

    Ok(config)
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
