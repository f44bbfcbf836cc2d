//! Error types for pgit-db

use pgit_core::CoreError;
use thiserror::Error;

/// State store errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Transaction management error (D003)
    #[error("[D003] Database transaction failed: {0}")]
    TransactionError(String),

    /// State table prefix is not a plain identifier (D004)
    #[error("[D004] Invalid state table prefix '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTablePrefix(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// DuckDB driver error with preserved source chain (D006)
    #[error("[D006] DuckDB error: {0}")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::DuckDb(err)
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        CoreError::State(err.to_string())
    }
}
