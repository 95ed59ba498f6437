//! Site-Archiver main entry point
//!
//! This is the command-line interface for the Site-Archiver single-site web archiver.

use clap::Parser;
use site_archiver::config::{load_config_from_env, load_config_with_hash, Config};
use site_archiver::crawler::run_archive;
use site_archiver::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Archiver: archives one website into Azure Blob Storage
///
/// Site-Archiver crawls every page reachable from a domain root, stays on
/// that domain, and stores each page plus the landing page's stylesheets
/// as date-partitioned blobs.
#[derive(Parser, Debug)]
#[command(name = "site-archiver")]
#[command(version = "1.0.0")]
#[command(about = "A single-site web archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (settings come from the environment when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be archived without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing .env file is fine; the real environment still applies
    let dotenv = dotenvy::dotenv().ok();

    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Loads configuration from the given file, or from the environment alone
fn load(path: Option<&PathBuf>) -> Result<Config, site_archiver::ConfigError> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("Loading configuration from the environment");
            load_config_from_env()
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_archiver=info,warn"),
            1 => EnvFilter::new("site_archiver=debug,info"),
            2 => EnvFilter::new("site_archiver=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
///
/// The storage secret is never printed, only whether one was found.
fn handle_dry_run(config: &Config) {
    println!("=== Site-Archiver Dry Run ===\n");

    println!("Site:");
    println!("  Domain root: {}", config.site.domain_root);
    println!("  Relative links: {:?}", config.site.relative_links);

    println!("\nStorage:");
    println!("  Account: {}", config.storage.account_name);
    println!("  Container: {}", config.storage.container_name);
    println!(
        "  Endpoint: {}",
        config.storage.endpoint.as_deref().unwrap_or("(default)")
    );
    println!("  Scratch directory: {}", config.storage.scratch_dir().display());
    println!("  Date format: {}", config.storage.date_format);
    println!(
        "  Secret ({}): {}",
        config.storage.connection_string_env,
        if config.secret.is_some() { "set" } else { "missing" }
    );

    println!("\nCrawler:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!(
        "  Continue on persist error: {}",
        config.crawler.continue_on_persist_error
    );
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start archiving from {}", config.site.domain_root);
}

/// Handles the main archive operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting archive of {}", config.site.domain_root);

    match run_archive(config).await {
        Ok(summary) => {
            tracing::info!("Archive completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Archive failed: {}", e);
            Err(e.into())
        }
    }
}
