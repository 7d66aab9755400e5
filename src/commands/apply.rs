use anyhow::Result;
use colored::Colorize;
use provision::{ExecuteOptions, ExecuteSummary, Outputs, RunReport, compute_diffs, execute};

use super::Workspace;
use super::plan::display_diff;
use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine;
use crate::progress::{BarProgress, PromptConfirm};
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let mut ws = Workspace::load(ctx)?;
    let plan = ws.plan(&args.target)?;
    let provisioner = engine::build(&ws.stack.engine, args.engine)?;

    display_diff(&compute_diffs(&ws.graph, &plan, &ws.state.resources));
    ws.warn_orphans();

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: usize::from(args.jobs.max(1)),
    };

    let report = execute(
        &ws.graph,
        &plan,
        provisioner.as_ref(),
        ws.state.resources.clone(),
        &opts,
        &mut BarProgress::new(ctx.quiet),
        &mut PromptConfirm::new(args.yes, true),
    )?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    if declined(&report) {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let (outputs, unresolved) = Outputs::collect_partial(&ws.stack.output_specs(), &report.states);
    let RunReport {
        states,
        summary,
        error,
        ..
    } = report;
    ws.state.update(&ws.state_dir, states, outputs)?;

    print_summary(&summary);
    if !ws.state.outputs.is_empty() && !ctx.quiet {
        ui::section("Outputs");
        for (name, value) in ws.state.outputs.iter() {
            ui::kv(name, &ui::format_value(value));
        }
    }

    match error {
        Some(err) => {
            ui::dim("State saved; re-run apply to resume from the failed resource");
            Err(err.into())
        }
        None => {
            for err in &unresolved {
                log::info!("{err}");
            }
            Ok(())
        }
    }
}

/// The user said no: nothing ran and nothing failed
fn declined(report: &RunReport) -> bool {
    report.error.is_none()
        && report.summary.skipped > 0
        && report.summary.total_changes() == 0
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        if summary.total_changes() == 0 {
            ui::success("Stack is up to date");
        } else {
            println!("  {} Stack applied successfully!", "✓".green().bold());
        }
    } else {
        println!("  {} Stack applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources not started", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
