//! Configuration types and parsing for pgit.yml

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Config file names looked up in the project directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["pgit.yml", "pgit.yaml"];

/// Project configuration from pgit.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the schema files, relative to the project directory
    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,

    /// Path of the DuckDB database file
    #[serde(default)]
    pub database: Option<String>,

    /// Prefix for the state tables (`<prefix>_migrations`, `<prefix>_file_states`)
    #[serde(default = "default_state_table_prefix")]
    pub state_table_prefix: String,
}

fn default_schema_dir() -> String {
    "schema".to_string()
}

fn default_state_table_prefix() -> String {
    "pgit".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            database: None,
            state_table_prefix: default_state_table_prefix(),
        }
    }
}

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

/// Whether `name` is safe to splice into SQL as an unquoted identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
        .is_match(name)
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    ///
    /// Looks for pgit.yml or pgit.yaml; defaults apply when neither exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.schema_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "schema_dir cannot be empty".to_string(),
            });
        }

        if !is_valid_identifier(&self.state_table_prefix) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "state_table_prefix '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                    self.state_table_prefix
                ),
            });
        }

        if matches!(&self.database, Some(db) if db.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: "database cannot be empty when set".to_string(),
            });
        }

        Ok(())
    }

    /// Schema root resolved against the project directory
    pub fn schema_dir_absolute(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.schema_dir)
    }

    /// Database path resolved against the project directory, if configured
    pub fn database_absolute(&self, project_dir: &Path) -> Option<PathBuf> {
        self.database.as_ref().map(|db| project_dir.join(db))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
