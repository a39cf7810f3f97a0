//! Run report generation.
//!
//! Produces the plain-text summary printed at the end of a run and the
//! JSON report written with `--report`.

use crate::models::{RunReport, StepStatus};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate the plain-text summary of a run.
pub fn generate_text_summary(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "📦 {} export: {}\n",
        report.metadata.source,
        report.metadata.input.display()
    ));

    for step in &report.steps {
        let timing = match step.status {
            StepStatus::Skipped => " (skipped)".to_string(),
            _ => format!(" ({}ms)", step.duration_ms),
        };
        output.push_str(&format!("   {} {}{}\n", step.status.emoji(), step.title, timing));
    }

    if report.post_files > 0 {
        output.push_str(&format!("   Post files found: {}\n", report.post_files));
    }

    output.push_str(&format!(
        "   Warnings: {} | Errors: {}\n",
        report.warning_count(),
        report.error_count()
    ));
    output.push_str(&format!(
        "   Duration: {:.1}s\n",
        report.metadata.duration_seconds
    ));

    if !report.summary.is_empty() {
        output.push('\n');
        output.push_str(&report.summary);
        output.push('\n');
    }

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
