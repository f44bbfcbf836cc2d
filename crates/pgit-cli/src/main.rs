//! pgit CLI - Git-aware schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::{migrate, rollback, status};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Migrate => migrate::execute(&cli.global),
        cli::Commands::Rollback => rollback::execute(&cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
    }
}

/// Log warnings by default, info with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
