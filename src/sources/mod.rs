//! Per-source task lists.
//!
//! Each export source wires the steps that apply to it, in order.

use crate::models::SourceKind;
use crate::pipeline::steps::{CheckExport, ScanPostsDir, ValidateOptions};
use crate::pipeline::{Step, TaskRunner};

/// Steps for a Substack CSV export.
fn substack_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(CheckExport),
        Box::new(ValidateOptions),
        Box::new(ScanPostsDir),
    ]
}

/// Steps for a Medium ZIP export.
fn medium_steps() -> Vec<Box<dyn Step>> {
    vec![Box::new(CheckExport), Box::new(ValidateOptions)]
}

/// Build the task runner for a source.
pub fn task_runner(source: SourceKind) -> TaskRunner {
    let steps = match source {
        SourceKind::Substack => substack_steps(),
        SourceKind::Medium => medium_steps(),
    };
    TaskRunner::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MigrationOptions, StepStatus};
    use crate::pipeline::MigrationContext;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_task_lists() {
        let substack: Vec<_> = task_runner(SourceKind::Substack)
            .titles()
            .map(String::from)
            .collect();
        assert_eq!(
            substack,
            vec![
                "Checking export file",
                "Validating options",
                "Scanning posts directory"
            ]
        );

        let medium = task_runner(SourceKind::Medium).titles().count();
        assert_eq!(medium, 2);
    }

    #[test]
    fn test_substack_run_with_warnings_succeeds() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("posts.csv");
        fs::write(&input, "post_id,title\n1.first,First\n").unwrap();

        let options = MigrationOptions {
            url: "https://example.substack.com/".to_string(),
            wait_after_scrape_ms: 2000,
            ..MigrationOptions::default()
        };
        let mut ctx = MigrationContext::new(SourceKind::Substack, input, options);

        assert!(task_runner(SourceKind::Substack).run(&mut ctx).is_ok());
        assert_eq!(ctx.errors.render(), "Removed trailing slash from site URL (https://example.substack.com)");
        assert_eq!(ctx.steps[2].status, StepStatus::Skipped);
    }

    #[test]
    fn test_medium_run_with_missing_export_fails() {
        let dir = TempDir::new().unwrap();
        let mut ctx = MigrationContext::new(
            SourceKind::Medium,
            dir.path().join("export.zip"),
            MigrationOptions {
                wait_after_scrape_ms: 0,
                ..MigrationOptions::default()
            },
        );

        let err = task_runner(SourceKind::Medium)
            .run(&mut ctx)
            .expect_err("missing export is fatal");
        assert_eq!(err.len(), 2);
        assert!(err.render().starts_with("Multiple errors:"));
        assert_eq!(ctx.steps[0].status, StepStatus::Failed);
        assert_eq!(ctx.steps[1].status, StepStatus::Done);
    }
}
