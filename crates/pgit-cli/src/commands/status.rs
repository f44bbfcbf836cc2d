//! Status command implementation

use anyhow::{Context, Result};
use pgit_core::{PlanOutcome, PlannedChange};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::short_version;
use crate::context::RuntimeContext;

/// Execute the status command
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let plan = ctx
        .migrator()
        .plan(&ctx.db)
        .context("Failed to compute migration status")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    print!("{}", render_plan(&plan, args.sql));
    Ok(())
}

/// Render the plan as a human-readable table.
pub(crate) fn render_plan(plan: &[PlannedChange], with_sql: bool) -> String {
    if plan.is_empty() {
        return "No schema files found\n".to_string();
    }

    let width = plan.iter().map(|p| p.path.len()).max().unwrap_or(0);
    let mut out = String::new();
    let mut pending = 0;

    for entry in plan {
        let current = short_version(&entry.current_version);
        match &entry.outcome {
            PlanOutcome::UpToDate => {
                out.push_str(&format!(
                    "  {:<width$}  up to date ({current})\n",
                    entry.path
                ));
            }
            PlanOutcome::Pending { version, sql } => {
                pending += 1;
                out.push_str(&format!(
                    "  {:<width$}  pending {current} -> {}\n",
                    entry.path,
                    short_version(version)
                ));
                if with_sql {
                    for line in sql.trim_end().lines() {
                        out.push_str(&format!("      {line}\n"));
                    }
                }
            }
            PlanOutcome::Error { reason } => {
                out.push_str(&format!("  {:<width$}  error: {reason}\n", entry.path));
            }
        }
    }

    out.push_str(&format!("\n{pending} of {} file(s) pending\n", plan.len()));
    out
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
