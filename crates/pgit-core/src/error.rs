//! Error types for pgit-core

use thiserror::Error;

/// Core error type for pgit
#[derive(Error, Debug)]
pub enum CoreError {
    /// P001: Malformed schema file (markers, missing sections, annotation)
    #[error("[P001] Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// P002: Requested version cannot be reached or is invalid for the file
    #[error("[P002] Version error for {path}: {message}")]
    Version { path: String, message: String },

    /// P003: Version-control collaborator failed
    #[error("[P003] Version control error: {0}")]
    Vcs(String),

    /// P004: Reading or writing persisted migration state failed
    #[error("[P004] Migration state error: {0}")]
    State(String),

    /// P005: A state row references a file that is not in the schema directory
    #[error("[P005] File '{path}' is recorded in migration state but was not found on disk")]
    FileNotLoaded { path: String },

    /// P006: Schema root is not inside the version-control repository
    #[error("[P006] Schema root '{root}' is outside repository '{repository}'")]
    PathOutsideRepository { root: String, repository: String },

    /// P007: Configuration file not found
    #[error("[P007] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// P008: Failed to parse configuration file
    #[error("[P008] Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// P009: Invalid configuration value
    #[error("[P009] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// P010: IO error
    #[error("[P010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// P011: IO error with file path context
    #[error("[P011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn parse(path: &str, message: impl Into<String>) -> Self {
        CoreError::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn version(path: &str, message: impl Into<String>) -> Self {
        CoreError::Version {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
