//! Data models for migration runs.
//!
//! This module contains the option set a run is configured with and the
//! records produced while it executes, which feed the final report.

use crate::errors::{ErrorGroup, Failure};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Export format being migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Substack CSV export
    Substack,
    /// Medium ZIP export
    Medium,
}

impl SourceKind {
    /// File extension the export is expected to carry.
    pub fn expected_extension(&self) -> &'static str {
        match self {
            SourceKind::Substack => "csv",
            SourceKind::Medium => "zip",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Substack => write!(f, "Substack"),
            SourceKind::Medium => write!(f, "Medium"),
        }
    }
}

/// Which scraping tasks a run enables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Scrape both web metadata and images (default)
    #[default]
    All,
    /// Scrape web metadata only
    Web,
    /// Scrape images only
    Img,
    /// Do not scrape
    None,
}

impl ScrapeMode {
    pub fn scrapes_web(&self) -> bool {
        matches!(self, ScrapeMode::All | ScrapeMode::Web)
    }

    pub fn scrapes_images(&self) -> bool {
        matches!(self, ScrapeMode::All | ScrapeMode::Img)
    }
}

impl fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeMode::All => write!(f, "all"),
            ScrapeMode::Web => write!(f, "web"),
            ScrapeMode::Img => write!(f, "img"),
            ScrapeMode::None => write!(f, "none"),
        }
    }
}

/// Effective options for a single run, after merging config file and CLI.
///
/// Raw values are kept as given; the options step fills in the parsed ones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationOptions {
    /// URL of the hosted source site, without trailing slash.
    pub url: String,
    /// Email of the general user created for posts without an author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Slug derived from the email's local part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_slug: Option<String>,
    /// Folder of HTML files named by post id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_dir: Option<PathBuf>,
    /// Import draft posts.
    pub drafts: bool,
    /// Target for existing "subscribe" anchors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe_link: Option<String>,
    /// Only migrate posts on or before this date (raw input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_before: Option<String>,
    /// Only migrate posts on or after this date (raw input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_after: Option<String>,
    /// Parsed date window.
    pub window: DateWindow,
    /// Scraping tasks to run.
    pub scrape: ScrapeMode,
    /// Milliseconds to wait after each scraped URL.
    pub wait_after_scrape_ms: u64,
}

/// Inclusive date range posts must fall into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<NaiveDate>,
}

impl DateWindow {
    /// True when the lower bound lies after the upper bound, so no post
    /// could ever match.
    pub fn is_inverted(&self) -> bool {
        matches!((self.after, self.before), (Some(after), Some(before)) if after > before)
    }
}

/// Outcome of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Done,
    Skipped,
    Failed,
}

impl StepStatus {
    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            StepStatus::Done => "✅",
            StepStatus::Skipped => "⏭️",
            StepStatus::Failed => "❌",
        }
    }
}

/// Record of a pipeline step, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub title: String,
    pub status: StepStatus,
    pub duration_ms: u64,
}

/// A failure as it appears in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub fatal: bool,
    pub message: String,
}

impl From<&Failure> for FailureRecord {
    fn from(failure: &Failure) -> Self {
        Self {
            fatal: failure.is_fatal(),
            message: failure.to_string(),
        }
    }
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub source: SourceKind,
    pub input: PathBuf,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// The complete run report.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub options: MigrationOptions,
    pub steps: Vec<StepRecord>,
    /// Number of HTML post files found in the posts directory.
    pub post_files: usize,
    pub fatal: bool,
    pub failures: Vec<FailureRecord>,
    /// Rendered summary of the failures, empty when there are none.
    pub summary: String,
}

impl RunReport {
    /// Builds the report from run metadata and the run's error group.
    pub fn new(
        metadata: RunMetadata,
        options: MigrationOptions,
        steps: Vec<StepRecord>,
        post_files: usize,
        errors: &ErrorGroup,
    ) -> Self {
        let summary = if errors.is_empty() {
            String::new()
        } else {
            errors.render()
        };

        Self {
            metadata,
            options,
            steps,
            post_files,
            fatal: errors.is_fatal(),
            failures: errors.iter().map(FailureRecord::from).collect(),
            summary,
        }
    }

    pub fn warning_count(&self) -> usize {
        self.failures.iter().filter(|f| !f.fatal).count()
    }

    pub fn error_count(&self) -> usize {
        self.failures.iter().filter(|f| f.fatal).count()
    }
}
