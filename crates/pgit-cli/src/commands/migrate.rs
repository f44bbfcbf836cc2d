//! Migrate command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{format_change, print_skipped};
use crate::context::RuntimeContext;

/// Execute the migrate command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let report = ctx
        .migrator()
        .apply_latest(&ctx.db)
        .context("Migration failed")?;

    match &report.migration {
        Some(migration) => {
            println!(
                "Migration {} applied {} file(s)",
                migration.id,
                report.applied.len()
            );
            for change in &report.applied {
                println!("  {}", format_change(change));
            }
        }
        None if report.skipped.is_empty() => println!("Schema is up to date"),
        None => println!("No files applied"),
    }

    print_skipped(&report.skipped);
    Ok(())
}
