//! Sequential step runner.
//!
//! Steps share a [`MigrationContext`]. A failing step never stops the steps
//! after it; its failure is captured in the context's [`ErrorGroup`] and the
//! run outcome is decided once every step has had its turn.

use crate::errors::{ErrorGroup, Failure};
use crate::models::{MigrationOptions, SourceKind, StepRecord, StepStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Shared state for one migration run.
#[derive(Debug)]
pub struct MigrationContext {
    pub source: SourceKind,
    /// Path of the export file.
    pub input: PathBuf,
    pub options: MigrationOptions,
    /// Every failure reported during the run.
    pub errors: ErrorGroup,
    /// HTML post files found in the posts directory.
    pub post_files: Vec<PathBuf>,
    /// Steps in the order they were visited.
    pub steps: Vec<StepRecord>,
}

impl MigrationContext {
    pub fn new(source: SourceKind, input: PathBuf, options: MigrationOptions) -> Self {
        Self {
            source,
            input,
            options,
            errors: ErrorGroup::new(),
            post_files: Vec::new(),
            steps: Vec::new(),
        }
    }
}

/// A single unit of work in a migration.
pub trait Step {
    /// Short description shown while the step runs.
    fn title(&self) -> &str;

    /// Whether the step applies to this run.
    fn enabled(&self, _ctx: &MigrationContext) -> bool {
        true
    }

    /// Run the step.
    ///
    /// Warnings can be pushed onto `ctx.errors` directly; an `Err` marks the
    /// step as failed.
    fn run(&self, ctx: &mut MigrationContext) -> Result<(), Failure>;
}

/// Runs steps in order against a shared context.
pub struct TaskRunner {
    steps: Vec<Box<dyn Step>>,
    show_progress: bool,
}

impl TaskRunner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps,
            show_progress: false,
        }
    }

    /// Show a spinner for each step.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Step titles, in execution order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.title())
    }

    /// Run every enabled step, then decide the outcome.
    ///
    /// Returns the run's error group as the error if any failure is fatal.
    /// On success, warnings stay in `ctx.errors`.
    pub fn run(&self, ctx: &mut MigrationContext) -> Result<(), ErrorGroup> {
        for step in &self.steps {
            let title = step.title().to_string();

            if !step.enabled(ctx) {
                debug!("Skipping step: {}", title);
                ctx.steps.push(StepRecord {
                    title,
                    status: StepStatus::Skipped,
                    duration_ms: 0,
                });
                continue;
            }

            info!("{}", title);
            let spinner = self.spinner(&title);
            let reported_before = ctx.errors.len();
            let started = Instant::now();
            let result = step.run(ctx);
            let duration_ms = started.elapsed().as_millis() as u64;

            // Fatal failures pushed inline fail the step just like an `Err`.
            let reported_fatal = ctx
                .errors
                .iter()
                .skip(reported_before)
                .any(Failure::is_fatal);

            let status = match result {
                Ok(()) if reported_fatal => StepStatus::Failed,
                Ok(()) => StepStatus::Done,
                Err(failure) => {
                    if failure.is_fatal() {
                        error!("{} failed: {}", title, failure);
                    } else {
                        warn!("{}: {}", title, failure);
                    }
                    ctx.errors.add(failure);
                    StepStatus::Failed
                }
            };

            if let Some(pb) = spinner {
                pb.finish_with_message(format!("{} {}", status.emoji(), title));
            }

            ctx.steps.push(StepRecord {
                title,
                status,
                duration_ms,
            });
        }

        match std::mem::take(&mut ctx.errors).into_result() {
            Ok(warnings) => {
                if !warnings.is_empty() {
                    info!("Completed with {} warning(s)", warnings.len());
                }
                ctx.errors = warnings;
                Ok(())
            }
            Err(group) => Err(group),
        }
    }

    fn spinner(&self, title: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(title.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}
