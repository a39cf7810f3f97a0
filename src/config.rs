//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ghost-migrate.toml` files.

use crate::cli::{Args, Source};
use crate::models::{MigrationOptions, ScrapeMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".ghost-migrate.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scraping settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Substack source settings.
    #[serde(default)]
    pub substack: SubstackConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Write a JSON run report to this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

/// Scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Which scraping tasks to run.
    #[serde(default)]
    pub mode: ScrapeMode,

    /// Time in milliseconds to wait after a URL is scraped.
    #[serde(default = "default_wait_after_scrape")]
    pub wait_after_scrape_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            mode: ScrapeMode::default(),
            wait_after_scrape_ms: default_wait_after_scrape(),
        }
    }
}

fn default_wait_after_scrape() -> u64 {
    2000
}

/// Substack source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstackConfig {
    /// URL of the hosted source site.
    #[serde(default = "default_url")]
    pub url: String,

    /// Email for the general user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Import draft posts.
    #[serde(default = "default_true")]
    pub drafts: bool,

    /// Target for existing "subscribe" anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe_link: Option<String>,
}

impl Default for SubstackConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            email: None,
            drafts: true,
            subscribe_link: None,
        }
    }
}

fn default_url() -> String {
    "https://ghost.io".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir/.ghost-migrate.toml`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if args.verbose {
            self.general.verbose = true;
        }
        if let Some(ref report) = args.report {
            self.general.report = Some(report.clone());
        }

        let scrape = match &args.source {
            Some(Source::Substack(s)) => Some(&s.scrape),
            Some(Source::Medium(m)) => Some(&m.scrape),
            None => None,
        };
        if let Some(scrape) = scrape {
            if let Some(mode) = scrape.scrape {
                self.scrape.mode = mode;
            }
            if let Some(wait) = scrape.wait_after_scrape {
                self.scrape.wait_after_scrape_ms = wait;
            }
        }

        if let Some(Source::Substack(s)) = &args.source {
            if let Some(ref url) = s.url {
                self.substack.url = url.clone();
            }
            if s.email.is_some() {
                self.substack.email = s.email.clone();
            }
            if s.no_drafts {
                self.substack.drafts = false;
            }
            if s.subscribe_link.is_some() {
                self.substack.subscribe_link = s.subscribe_link.clone();
            }
        }
    }

    /// Build the option set for a run. Values are not validated here.
    pub fn migration_options(&self, args: &Args) -> MigrationOptions {
        let mut options = MigrationOptions {
            scrape: self.scrape.mode,
            wait_after_scrape_ms: self.scrape.wait_after_scrape_ms,
            ..MigrationOptions::default()
        };

        if let Some(Source::Substack(s)) = &args.source {
            options.url = self.substack.url.clone();
            options.email = self.substack.email.clone();
            options.drafts = self.substack.drafts;
            options.subscribe_link = self.substack.subscribe_link.clone();
            options.posts_dir = s.read_posts.clone();
            options.posts_before = s.posts_before.clone();
            options.posts_after = s.posts_after.clone();
        }

        options
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
