//! E-waste Harvest main entry point
//!
//! This is the command-line interface for the Global E-waste Monitor collector.

use anyhow::{Context, Result};
use clap::Parser;
use ewaste_harvest::config::{load_config_with_hash, validate_year, Config};
use ewaste_harvest::crawler::{Coordinator, CrawlScope};
use ewaste_harvest::output::{export_records, print_preview, print_statistics, RunStatistics};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// E-waste Harvest: a polite collector for e-waste statistics
///
/// Walks every continent, region and country sheet on globalewaste.org,
/// one year page at a time, and saves the metrics as CSV and JSON.
#[derive(Parser, Debug)]
#[command(name = "ewaste-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite collector for Global E-waste Monitor statistics", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Collect only the configured sample entities and years
    #[arg(long)]
    test: bool,

    /// Restrict a full run to this year (repeatable)
    #[arg(long = "year", value_name = "YYYY", value_parser = parse_year, conflicts_with = "test")]
    years: Vec<String>,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and scope without crawling
    #[arg(long)]
    dry_run: bool,
}

fn parse_year(value: &str) -> std::result::Result<String, String> {
    validate_year(value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.to_string_lossy().into_owned();
    }

    let cancel = CancellationToken::new();
    let coordinator = Coordinator::new(config.clone(), cancel.clone())
        .context("Failed to set up the crawler")?;
    let scope = coordinator.scope(cli.test, cli.years);

    if cli.dry_run {
        handle_dry_run(&config, &scope);
        return Ok(());
    }

    spawn_interrupt_listener(cancel);
    handle_collection(&coordinator, &config, &scope).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ewaste_harvest=info,warn"),
            1 => EnvFilter::new("ewaste_harvest=debug,info"),
            2 => EnvFilter::new("ewaste_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the crawl on the first Ctrl-C
fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, finishing with the records collected so far");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Could not listen for Ctrl-C: {}", e),
        }
    });
}

/// Handles the --dry-run mode: shows the effective configuration and scope
fn handle_dry_run(config: &Config, scope: &CrawlScope) {
    println!("=== E-waste Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Listing page: {}", config.site.base_url);
    println!("  Site root: {}", config.site.site_root);

    println!("\nFetching:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Backoff base: {}ms", config.fetch.backoff_base_ms);
    println!("  Retry statuses: {:?}", config.fetch.retry_statuses);

    println!("\nPacing:");
    println!("  Between years: {}ms", config.crawl.year_delay_ms);
    println!("  Between entities: {}ms", config.crawl.entity_delay_ms);
    println!(
        "  Between sample entities: {}ms",
        config.crawl.sample_entity_delay_ms
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    let prefix = if scope.is_sample() {
        &config.output.sample_prefix
    } else {
        &config.output.full_prefix
    };
    println!("  Files: {}_<timestamp>.csv / .json", prefix);

    println!("\nScope:");
    match scope {
        CrawlScope::Full { years: None } => println!("  Every entity, every year"),
        CrawlScope::Full { years: Some(years) } => println!("  Every entity, years {}", years),
        CrawlScope::Sample(targets) => {
            println!("  Sample of {} entities, years {}", targets.len(), targets.years);
            println!("  Continents: {:?}", targets.continents);
            println!("  Regions: {:?}", targets.regions);
            println!("  Countries: {:?}", targets.countries);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main collection run
async fn handle_collection(
    coordinator: &Coordinator,
    config: &Config,
    scope: &CrawlScope,
) -> Result<()> {
    let started = Instant::now();

    if scope.is_sample() {
        tracing::info!("Starting sample collection");
    } else {
        tracing::info!("Starting full collection");
    }

    let records = coordinator.collect(scope).await;

    let paths = export_records(&records, &config.output, scope.is_sample())
        .context("Failed to save the collected records")?;
    for path in &paths {
        println!("Saved: {}", path.display());
    }

    if !records.is_empty() {
        print_preview(&records);
    }
    print_statistics(&RunStatistics::from_records(&records), started.elapsed());

    Ok(())
}
