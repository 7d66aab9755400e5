//! Plan preview - what apply or destroy would do

use anyhow::Result;
use colored::Colorize;
use provision::{ChangeKind, DiffSummary, ResourceDiff, compute_diffs, compute_removals, group_by_type};

use super::Workspace;
use crate::Context;
use crate::cli::PlanArgs;
use crate::ui;

pub fn run(ctx: &Context, args: PlanArgs) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let plan = ws.plan(&args.target)?;

    if args.destroy {
        let removals = compute_removals(&ws.graph, &plan, &ws.state.resources);
        display_diff(&removals);
        return Ok(());
    }

    let diffs = compute_diffs(&ws.graph, &plan, &ws.state.resources);
    display_diff(&diffs);

    if !ctx.quiet {
        ui::section("Execution order");
        for (n, wave) in plan.waves(&ws.graph).iter().enumerate() {
            println!("  {} {}", format!("[{}]", n + 1).blue().bold(), wave.join(", "));
        }
    }
    ws.warn_orphans();
    Ok(())
}

fn symbol(change: ChangeKind) -> colored::ColoredString {
    let s = change.symbol().to_string();
    match change {
        ChangeKind::Create => s.green(),
        ChangeKind::Update => s.yellow(),
        ChangeKind::Unknown => s.cyan(),
        ChangeKind::Delete => s.red(),
        ChangeKind::NoChange => s.dimmed(),
    }
}

fn describe(diff: &ResourceDiff) -> String {
    match diff.change {
        ChangeKind::Create => format!("(new, was {})", diff.status),
        ChangeKind::Update if diff.changed_args.is_empty() => "(retry)".to_string(),
        ChangeKind::Update => format!("({})", diff.changed_args.join(", ")),
        ChangeKind::Unknown => "(inputs known after apply)".to_string(),
        ChangeKind::Delete => "(will delete)".to_string(),
        ChangeKind::NoChange => String::new(),
    }
}

/// Display predicted changes, grouped by resource kind
pub fn display_diff(diffs: &[ResourceDiff]) {
    let changes: Vec<ResourceDiff> = diffs.iter().filter(|d| d.is_change()).cloned().collect();
    if changes.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Resource Changes".bold()
    );
    println!("│");

    for (kind, kind_diffs) in group_by_type(&changes) {
        println!("│ {}", kind.bold());
        for diff in kind_diffs {
            println!(
                "│   {} {:<30} {}",
                symbol(diff.change),
                diff.resource_id,
                describe(diff).dimmed()
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to update, {} unknown, {} to delete, {} unchanged",
        summary.creates.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.unknown.to_string().cyan(),
        summary.deletes.to_string().red(),
        summary.no_change.to_string().dimmed()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
