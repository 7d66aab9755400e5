//! Terminal progress and confirmation for runs

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use provision::{ApplyResult, ConfirmCallback, ProgressCallback, ResourceKind};

/// Progress bar over the resources of a run
pub struct BarProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

fn bar(len: u64) -> ProgressBar {
    let style = ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len).with_style(style)
}

fn symbol(result: &ApplyResult) -> colored::ColoredString {
    match result {
        ApplyResult::Unchanged => "○".dimmed(),
        ApplyResult::Created | ApplyResult::Updated => "✓".green(),
        ApplyResult::Removed => "-".red(),
        ApplyResult::Failed { .. } => "✗".red(),
        ApplyResult::Skipped { .. } => "⊘".yellow(),
    }
}

impl ProgressCallback for BarProgress {
    fn on_plan_start(&mut self, count: usize) {
        self.bar = Some(if self.quiet {
            ProgressBar::hidden()
        } else {
            bar(count as u64)
        });
    }

    fn on_resource_start(&mut self, id: &str, kind: &ResourceKind) {
        log::info!("Provisioning {id} ({kind})");
        if let Some(pb) = &self.bar {
            pb.set_message(format!("{id} {}", kind.to_string().dimmed()));
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        log::debug!("{id}: {result}");
        if let Some(pb) = &self.bar {
            if !matches!(result, ApplyResult::Unchanged) {
                pb.println(format!("    {} {:<30} {}", symbol(result), id, result.to_string().dimmed()));
            }
            pb.inc(1);
        }
    }

    fn on_plan_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Interactive confirmation, skipped by `--yes`
pub struct PromptConfirm {
    yes: bool,
    default: bool,
}

impl PromptConfirm {
    pub fn new(yes: bool, default: bool) -> Self {
        Self { yes, default }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        if self.yes {
            return Ok(true);
        }

        println!();
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(self.default)
            .interact()
            .context("Confirmation needs a terminal; pass --yes to skip it")?;

        Ok(confirmed)
    }
}
