//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// pgit - Git-aware schema migrations
#[derive(Parser, Debug)]
#[command(name = "pgit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Root directory of the schema files (overrides `schema_dir`)
    #[arg(short, long, global = true)]
    pub root: Option<String>,

    /// DuckDB database holding the schema and migration state
    #[arg(short, long, global = true, env = "PGIT_DATABASE")]
    pub database: Option<String>,

    /// Prefix for the migration state tables (overrides `state_table_prefix`)
    #[arg(long, global = true)]
    pub table_prefix: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the latest version of every schema file
    Migrate,

    /// Roll back the most recent migration
    Rollback,

    /// Show what migrate would do without changing the database
    Status(StatusArgs),
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Include the SQL that would run for pending files
    #[arg(long)]
    pub sql: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
