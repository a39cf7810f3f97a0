//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{ScrapeMode, SourceKind};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// ghost-migrate - move Substack and Medium exports into Ghost
///
/// Checks the export and the migration options, runs every step,
/// and reports all warnings and errors together at the end.
///
/// Examples:
///   migrate substack posts.csv --url https://example.substack.com
///   migrate substack posts.csv --read-posts ./posts --posts-after "August 16 2021"
///   migrate medium medium-export.zip --scrape none
///   migrate --report run.json substack posts.csv
///   migrate --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Export source to migrate
    #[command(subcommand)]
    pub source: Option<Source>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ghost-migrate.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE", global = true, env = "GHOST_MIGRATE_REPORT")]
    pub report: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .ghost-migrate.toml configuration file
    #[arg(long, exclusive = true)]
    pub init_config: bool,
}

/// Supported export sources.
#[derive(Subcommand, Debug, Clone)]
pub enum Source {
    /// Migrate from a Substack CSV
    Substack(SubstackArgs),
    /// Migrate from a Medium ZIP export
    Medium(MediumArgs),
}

/// Scraping flags shared by every source.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ScrapeArgs {
    /// Configure scraping tasks
    #[arg(short, long, value_name = "MODE")]
    pub scrape: Option<ScrapeMode>,

    /// Time in ms to wait after a URL is scraped
    #[arg(long, value_name = "MS")]
    pub wait_after_scrape: Option<u64>,
}

/// Options for `migrate substack`.
#[derive(ClapArgs, Debug, Clone)]
pub struct SubstackArgs {
    /// Path to a csv file
    #[arg(value_name = "PATH_TO_FILE")]
    pub path: PathBuf,

    #[command(flatten)]
    pub scrape: ScrapeArgs,

    /// URL (without trailing slash) of the hosted source site, used for scraping
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Email for a general user, e.g. john@mycompany.com creates user `john`
    #[arg(short, long, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Folder of HTML files (file name = post id) to read post content from
    #[arg(short = 'p', long, value_name = "DIR")]
    pub read_posts: Option<PathBuf>,

    /// Skip draft posts
    #[arg(long)]
    pub no_drafts: bool,

    /// Path existing "subscribe" anchors will link to, e.g. "/join-us"
    #[arg(long, value_name = "PATH")]
    pub subscribe_link: Option<String>,

    /// Only migrate posts before and including a given date, e.g. 'March 20 2018'
    #[arg(long, value_name = "DATE")]
    pub posts_before: Option<String>,

    /// Only migrate posts after and including a given date, e.g. 'August 16 2021'
    #[arg(long, value_name = "DATE")]
    pub posts_after: Option<String>,
}

/// Options for `migrate medium`.
#[derive(ClapArgs, Debug, Clone)]
pub struct MediumArgs {
    /// Path to a Medium export zip
    #[arg(value_name = "PATH_TO_ZIP")]
    pub path: PathBuf,

    #[command(flatten)]
    pub scrape: ScrapeArgs,
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Substack(_) => SourceKind::Substack,
            Source::Medium(_) => SourceKind::Medium,
        }
    }

    /// Path of the export file.
    pub fn input(&self) -> &PathBuf {
        match self {
            Source::Substack(s) => &s.path,
            Source::Medium(m) => &m.path,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Only catches combinations clap cannot express. Everything about the
    /// export itself is checked by the pipeline so it ends up in the report.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.source.is_none() {
            return Err("A source is required: substack or medium".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref report) = self.report {
            if report.is_dir() {
                return Err(format!(
                    "Report path is a directory: {}",
                    report.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
