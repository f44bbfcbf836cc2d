//! Rollback command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::commands::common::{format_change, print_skipped};
use crate::context::RuntimeContext;

/// Execute the rollback command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let report = ctx
        .migrator()
        .rollback(&ctx.db)
        .context("Rollback failed; the migration was left in place")?;

    let Some(migration) = &report.migration else {
        println!("No migrations to roll back");
        return Ok(());
    };

    println!(
        "Rolled back migration {} ({} file(s))",
        migration.id,
        report.rolled_back.len()
    );
    for change in &report.rolled_back {
        println!("  {}", format_change(change));
    }

    print_skipped(&report.skipped);
    Ok(())
}
