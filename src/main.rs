//! ghost-migrate - move blog exports into Ghost
//!
//! A CLI tool that runs the migration steps for a Substack or Medium
//! export, collects every warning and error along the way, and decides
//! once at the end whether the run failed.
//!
//! Exit codes:
//!   0 - Success (possibly with warnings)
//!   1 - Runtime error (bad arguments, unreadable config, report not written)
//!   2 - Migration failed with fatal errors

mod cli;
mod config;
mod errors;
mod models;
mod pipeline;
mod report;
mod sources;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::{RunMetadata, RunReport};
use pipeline::MigrationContext;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("ghost-migrate v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_migration(&args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Migration aborted: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ghost-migrate.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins if set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the migration for the selected source. Returns exit code (0 or 2).
fn run_migration(args: &Args) -> Result<i32> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    let Some(source) = args.source.as_ref() else {
        anyhow::bail!("A source is required: substack or medium");
    };

    let mut config = load_config(args)?;
    config.merge_with_args(args);

    let options = config.migration_options(args);
    let mut ctx = MigrationContext::new(source.kind(), source.input().clone(), options);
    let runner = sources::task_runner(source.kind()).with_progress(!args.quiet);

    if config.general.verbose {
        println!("🔎 Migrating from export at {}", ctx.input.display());
        println!(
            "   Scraping: web {} | images {}",
            yes_no(ctx.options.scrape.scrapes_web()),
            yes_no(ctx.options.scrape.scrapes_images())
        );
        for (i, title) in runner.titles().enumerate() {
            println!("   {}. {}", i + 1, title);
        }
        println!();
    }

    let (errors, fatal) = match runner.run(&mut ctx) {
        Ok(()) => (std::mem::take(&mut ctx.errors), false),
        Err(group) => (group, true),
    };

    let metadata = RunMetadata {
        source: ctx.source,
        input: ctx.input.clone(),
        started_at,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = RunReport::new(
        metadata,
        ctx.options.clone(),
        std::mem::take(&mut ctx.steps),
        ctx.post_files.len(),
        &errors,
    );

    if args.quiet {
        if !errors.is_empty() {
            eprintln!("{}", errors);
        }
    } else {
        println!("\n{}", report::generate_text_summary(&report));
    }

    if let Some(ref path) = config.general.report {
        report::write_json_report(&report, path)?;
        info!("Run report written to {}", path.display());
    }

    if fatal {
        eprintln!("⛔ Migration failed with fatal errors (exit code 2).");
        return Ok(2);
    }

    if !args.quiet {
        if errors.is_empty() {
            println!("✅ Migration checks passed.");
        } else {
            println!("✅ Migration checks passed with {} warning(s).", errors.len());
        }
    }

    Ok(0)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
