//! Error types for pgit-git

use pgit_core::CoreError;
use thiserror::Error;

/// Git subprocess errors
#[derive(Error, Debug)]
pub enum GitError {
    /// The git binary could not be started (G001)
    #[error("[G001] Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// git exited unsuccessfully (G002)
    #[error("[G002] `git {command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// git produced output that could not be interpreted (G003)
    #[error("[G003] Unexpected output from `git {command}`: {message}")]
    UnexpectedOutput { command: String, message: String },

    /// A commit id argument was not a full object id (G004)
    #[error("[G004] Invalid commit id '{0}'")]
    InvalidCommit(String),
}

/// Result type alias for GitError
pub type GitResult<T> = Result<T, GitError>;

impl From<GitError> for CoreError {
    fn from(err: GitError) -> Self {
        CoreError::Vcs(err.to_string())
    }
}
