//! Course-Ripple main entry point
//!
//! This is the command-line interface for the Course-Ripple catalog harvester.

use anyhow::Context;
use clap::Parser;
use course_ripple::config::{read_config_with_hash, validate, Config};
use course_ripple::crawler::run_crawl;
use course_ripple::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Course-Ripple: a rate-limited course catalog harvester
///
/// Course-Ripple discovers every course detail page behind a catalog listing,
/// extracts one normalized record per course, and writes courses.json,
/// courses.csv and summary.md into the output directory.
#[derive(Parser, Debug)]
#[command(name = "course-ripple")]
#[command(version)]
#[command(about = "A rate-limited course catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory receiving courses.json, courses.csv and summary.md
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum number of listing page loads
    #[arg(long)]
    max_pages: Option<u32>,

    /// Number of concurrent detail workers
    #[arg(long)]
    concurrency: Option<u32>,

    /// Sustained request rate (requests per second)
    #[arg(long)]
    rate: Option<f64>,

    /// Show the browser window when a scripted browser is used
    #[arg(long)]
    headed: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.display().to_string();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
        if let Some(rate) = self.rate {
            config.crawler.rate = rate;
        }
        if self.headed {
            config.crawler.headed = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = read_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), "defaults".to_string())
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    handle_crawl(config, &config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("course_ripple=info,warn"),
            1 => EnvFilter::new("course_ripple=debug,info"),
            2 => EnvFilter::new("course_ripple=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Course-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Rate: {} req/s (burst {})",
        config.crawler.rate, config.crawler.burst
    );
    println!("  No-growth streak: {}", config.crawler.no_growth_streak);
    println!(
        "  Max load-more rounds: {}",
        config.crawler.max_load_more_rounds
    );
    println!("  Headed: {}", config.crawler.headed);

    println!("\nRetry Policy:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms doubling, capped at {}ms",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing path: {}", config.site.listing_path);
    println!("  Page parameter: {}", config.site.page_param);
    println!("  Course path: {}", config.site.course_path);
    println!("  Timeout: {}s", config.site.timeout_seconds);
    println!("  User agent: {}", config.site.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Config hash: {}", config_hash);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let output_dir = config.output.directory.clone();

    match run_crawl(config, config_hash).await {
        Ok(summary) => {
            print_summary(&summary);
            println!(
                "\nScraped {} courses into {}",
                summary.records_exported, output_dir
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
