//! Weavemap main entry point
//!
//! Command-line interface for the exposition crawler and layout mapper.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use weavemap::config::load_config_with_hash;
use weavemap::state::StalenessMode;

/// Weavemap: an exposition crawler and layout mapper
///
/// Weavemap crawls the expositions of a research-publishing platform,
/// extracts the positioned content elements of every page, scores page
/// layouts, categorizes outbound links, and re-crawls incrementally
/// based on the platform's feed.
#[derive(Parser, Debug)]
#[command(name = "weavemap")]
#[command(version = "1.0.0")]
#[command(about = "An exposition crawler and layout mapper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume mode: also re-crawl records older than the resume window
    #[arg(long, conflicts_with = "force")]
    resume: bool,

    /// Re-crawl every exposition, ignoring staleness
    #[arg(long)]
    force: bool,

    /// Crawl a single exposition by its root page URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "url"])]
    dry_run: bool,

    /// Show merged rollup statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "url"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let mode = if cli.resume {
        StalenessMode::Resume
    } else {
        StalenessMode::Normal
    };

    if let Some(url) = cli.url.as_deref() {
        tracing::info!("Crawling single exposition: {}", url);
        weavemap::crawler::crawl_one(config, url, cli.force).await?;
        return Ok(());
    }

    let summary = weavemap::crawler::crawl(config, mode, cli.force).await?;
    println!(
        "Crawl finished: {} listed, {} stale, {} completed, {} failed, {} skipped",
        summary.listed, summary.stale, summary.completed, summary.failed, summary.skipped
    );
    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weavemap=info,warn"),
            1 => EnvFilter::new("weavemap=debug,info"),
            2 => EnvFilter::new("weavemap=trace,debug"),
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

/// Handles the --dry-run mode
fn handle_dry_run(config: &weavemap::config::Config) {
    println!("=== Weavemap Dry Run ===\n");

    println!("Platform:");
    println!("  Base URL: {}", config.platform.base_url);
    println!("  Media URL: {}", config.platform.media_url);
    println!("  Feed URL: {}", config.platform.feed_url);
    println!("  DOI token: {}", config.platform.doi_token);

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.max_workers);
    println!("  Max in-flight requests: {}", config.crawler.max_in_flight);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);

    println!("\nStaleness:");
    println!("  Tolerance: {}s", config.staleness.tolerance_secs);
    println!("  Resume window: {}s", config.staleness.resume_window_secs);

    println!("\nOutput:");
    println!("  Research dir: {}", config.output.research_dir);
    println!("  Stats file: {}", config.output.stats_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode
fn handle_stats(config: &weavemap::config::Config) -> anyhow::Result<()> {
    use weavemap::output::MergedStats;

    let stats = MergedStats::load(Path::new(&config.output.stats_path))?;
    println!(
        "{} expositions in {}",
        stats.len(),
        config.output.stats_path
    );
    Ok(())
}
