//! Exposition feed
//!
//! The platform publishes a JSON feed listing every public exposition
//! with its default page, meta page and last-modified time. The feed
//! drives batch crawls and supplies the remote timestamps the staleness
//! decider compares against.

use crate::crawler::fetcher::PageFetcher;
use crate::model::ExpoMeta;
use crate::{Result, WeaveError};

/// Fetches and parses the exposition feed
///
/// # Returns
///
/// * `Ok(Vec<ExpoMeta>)` - One entry per listed exposition
/// * `Err(WeaveError::Feed)` - The feed was unreachable or malformed
pub async fn fetch_feed<F: PageFetcher>(fetcher: &F, feed_url: &str) -> Result<Vec<ExpoMeta>> {
    tracing::info!("fetching exposition feed from {}", feed_url);
    let body = fetcher.fetch(feed_url).await.into_body(feed_url)?;
    parse_feed(&body)
}

/// Parses the feed body, dropping entries without a default page
pub fn parse_feed(body: &str) -> Result<Vec<ExpoMeta>> {
    let entries: Vec<ExpoMeta> =
        serde_json::from_str(body).map_err(|e| WeaveError::Feed(e.to_string()))?;

    let total = entries.len();
    let entries: Vec<ExpoMeta> = entries
        .into_iter()
        .filter(|entry| entry.default_page.is_some())
        .collect();

    if entries.len() < total {
        tracing::warn!(
            "feed contained {} entries without a default page",
            total - entries.len()
        );
    }

    Ok(entries)
}
