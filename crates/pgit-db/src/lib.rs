//! pgit-db - DuckDB migration state store for pgit
//!
//! This crate provides [`DuckDbConnection`], the [`pgit_core::DatabaseConnection`]
//! implementation that executes schema SQL and records per-file versions in
//! DuckDB.

pub mod connection;
pub mod error;

pub use connection::{DuckDbConnection, DEFAULT_TABLE_PREFIX};
pub use error::{DbError, DbResult};
