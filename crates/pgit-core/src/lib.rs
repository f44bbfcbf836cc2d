//! pgit-core - Core library for pgit
//!
//! This crate provides the two schema-file dialects, schema directory
//! discovery, migration-state types, configuration, and the migrator that
//! drives a [`DatabaseConnection`] and a [`VersionControl`] collaborator.

pub mod config;
pub mod directory;
pub mod error;
pub mod migrator;
pub mod report;
pub mod schema_file;
pub mod state;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::Config;
pub use directory::SchemaDirectory;
pub use error::{CoreError, CoreResult};
pub use migrator::Migrator;
pub use report::{ApplyReport, FileChange, PlanOutcome, PlannedChange, RollbackReport, SkippedFile};
pub use schema_file::{
    ChangesetFile, DefinitionFile, FileKind, SchemaFile, SqlChange, UNCOMMITTED_VERSION,
};
pub use state::{FileMigrationState, Migration, MigrationId, MigrationState};
pub use traits::{DatabaseConnection, VersionControl};
