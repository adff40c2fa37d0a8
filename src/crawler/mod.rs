//! Crawler module: fetching, page graph discovery, rate limiting, and
//! batch coordination

mod coordinator;
mod feed;
pub mod fetcher;
mod limiter;
mod pages;

pub use coordinator::{BatchSummary, Coordinator};
pub use feed::{fetch_feed, parse_feed};
pub use fetcher::{build_http_client, FetchOutcome, HttpFetcher, PageFetcher};
pub use limiter::HostLimiter;
pub use pages::{discover_pages, find_meta_link, pages_in};

use crate::config::Config;
use crate::state::StalenessMode;
use crate::Result;

/// Runs a feed-driven crawl batch with the production HTTP fetcher
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `mode` - Staleness mode (normal or resume)
/// * `force` - Re-crawl every exposition regardless of staleness
pub async fn crawl(config: Config, mode: StalenessMode, force: bool) -> Result<BatchSummary> {
    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
    let coordinator = Coordinator::new(config, fetcher)?;
    install_shutdown_handler(&coordinator);
    coordinator.run_batch(mode, force).await
}

/// Crawls a single exposition by URL with the production HTTP fetcher
pub async fn crawl_one(config: Config, url: &str, force: bool) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
    let coordinator = Coordinator::new(config, fetcher)?;
    install_shutdown_handler(&coordinator);
    coordinator.crawl_single(url, force).await
}

/// Stops the batch between expositions on Ctrl-C
///
/// Expositions already written stay valid; the one in flight is
/// abandoned without partial persistence.
fn install_shutdown_handler<F: PageFetcher + 'static>(coordinator: &Coordinator<F>) {
    let flag = coordinator.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current expositions");
            flag.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });
}
