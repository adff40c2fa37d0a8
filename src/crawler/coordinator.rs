//! Crawl coordinator
//!
//! Orchestrates a crawl batch: the staleness decider gates which
//! expositions are processed at all, a bounded worker pool processes the
//! stale ones concurrently, and each worker runs the per-exposition
//! pipeline (page graph discovery → per-page classification and
//! extraction → copyright merge → aggregation → persistence).
//!
//! Pages within one exposition are processed sequentially in discovery
//! order. Exposition-level failures abort only that exposition; the
//! batch continues, and the failed exposition's record carries its error
//! instead of partial data. A shutdown flag is honored between
//! expositions; in-flight work is abandoned without partial persistence.

use crate::config::Config;
use crate::crawler::feed::fetch_feed;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::pages::{discover_pages, find_meta_link};
use crate::extract::extract_page;
use crate::media::{fetch_copyrights, fetch_meta_page, merge_copyrights, NullResolver};
use crate::model::{ExpoMeta, Exposition, Page, PageType};
use crate::output::{finalize, rollup, ExpositionStore, MergedStats};
use crate::state::{scan_records, CrawlRecord, StalenessDecider, StalenessMode};
use crate::url::{clean_url, exposition_id, page_number};
use crate::{Result, WeaveError};
use scraper::Html;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Outcome tally of a crawl batch
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    /// Entries listed by the feed
    pub listed: usize,
    /// Entries the staleness decider selected
    pub stale: usize,
    /// Expositions crawled and written
    pub completed: usize,
    /// Expositions aborted with an error record
    pub failed: usize,
    /// Expositions skipped (locked by another worker, unusable entry)
    pub skipped: usize,
}

/// Per-exposition outcome
enum ExpoOutcome {
    Completed,
    Failed,
    Skipped,
}

/// Main crawl coordinator
///
/// Carries the full crawl context (config, fetcher, store, rollup
/// stats, shutdown flag) explicitly, so expositions can be processed in
/// parallel without shared mutable session state.
pub struct Coordinator<F: PageFetcher> {
    config: Arc<Config>,
    fetcher: Arc<F>,
    store: Arc<ExpositionStore>,
    stats: Arc<Mutex<MergedStats>>,
    shutdown: Arc<AtomicBool>,
}

impl<F: PageFetcher> Clone for Coordinator<F> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<F: PageFetcher + 'static> Coordinator<F> {
    /// Creates a coordinator over the given fetch capability
    pub fn new(config: Config, fetcher: F) -> Result<Self> {
        let store = ExpositionStore::new(Path::new(&config.output.research_dir))?;
        let stats = MergedStats::load(Path::new(&config.output.stats_path))?;

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            store: Arc::new(store),
            stats: Arc::new(Mutex::new(stats)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The flag a signal handler sets to stop the batch between
    /// expositions
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs a full crawl batch driven by the exposition feed
    ///
    /// # Arguments
    ///
    /// * `mode` - Staleness mode (normal or resume)
    /// * `force` - Re-crawl every listed exposition regardless of
    ///   staleness, clearing its previous record first
    pub async fn run_batch(&self, mode: StalenessMode, force: bool) -> Result<BatchSummary> {
        let entries = fetch_feed(self.fetcher.as_ref(), &self.config.platform.feed_url).await?;
        let mut summary = BatchSummary {
            listed: entries.len(),
            ..BatchSummary::default()
        };

        let stale_entries = if force {
            entries
        } else {
            self.select_stale(entries, mode)
        };
        summary.stale = stale_entries.len();
        tracing::info!(
            "{} of {} expositions are new or outdated",
            summary.stale,
            summary.listed
        );

        let workers = Arc::new(Semaphore::new(self.config.crawler.max_workers as usize));
        let mut join_set: JoinSet<ExpoOutcome> = JoinSet::new();

        for entry in stale_entries {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested, not starting further expositions");
                break;
            }

            let Ok(permit) = workers.clone().acquire_owned().await else {
                break;
            };
            let worker = self.clone();
            join_set.spawn(async move {
                let _permit = permit;
                worker.crawl_exposition(entry, force).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(ExpoOutcome::Completed) => summary.completed += 1,
                Ok(ExpoOutcome::Failed) => summary.failed += 1,
                Ok(ExpoOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!("worker panicked: {}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "batch done: {} completed, {} failed, {} skipped",
            summary.completed,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    /// Crawls a single exposition by its root page URL
    pub async fn crawl_single(&self, url: &str, force: bool) -> Result<()> {
        let meta = ExpoMeta {
            default_page: Some(url.to_string()),
            ..ExpoMeta::default()
        };
        match self.crawl_exposition(meta, force).await {
            ExpoOutcome::Completed => Ok(()),
            ExpoOutcome::Failed => Err(WeaveError::Persistence(format!(
                "exposition at {} failed; see its record for the error",
                url
            ))),
            ExpoOutcome::Skipped => Err(WeaveError::Locked {
                id: exposition_id(url).unwrap_or(0),
            }),
        }
    }

    /// Applies the staleness decider to the feed entries
    fn select_stale(&self, entries: Vec<ExpoMeta>, mode: StalenessMode) -> Vec<ExpoMeta> {
        let records = scan_records(self.store.research_dir());
        let decider = StalenessDecider::new(&self.config.staleness, mode);
        let now = chrono::Utc::now().timestamp();

        entries
            .into_iter()
            .filter(|entry| {
                let Some(id) = self.entry_id(entry) else {
                    return false;
                };
                let record = records.get(&id).map(|local| CrawlRecord {
                    exposition_id: id,
                    remote_last_modified: entry.last_modified.unwrap_or(0),
                    local_timestamp: *local,
                });
                let decision = decider.decide(record.as_ref(), now);
                tracing::debug!("exposition {}: {:?}", id, decision);
                decision.is_stale()
            })
            .collect()
    }

    fn entry_id(&self, entry: &ExpoMeta) -> Option<u64> {
        entry.id.or_else(|| {
            entry
                .default_page
                .as_deref()
                .and_then(|url| exposition_id(url).ok())
        })
    }

    /// Crawls one exposition end to end and persists its record
    ///
    /// All-or-nothing per exposition: either the completed record or an
    /// error record is written, never a partial one.
    async fn crawl_exposition(&self, meta: ExpoMeta, force: bool) -> ExpoOutcome {
        let Some(raw_url) = meta.default_page.clone() else {
            tracing::warn!("feed entry without default page, skipping");
            return ExpoOutcome::Skipped;
        };
        let url = match clean_url(&raw_url) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                tracing::warn!("unusable exposition URL {}: {}", raw_url, e);
                return ExpoOutcome::Skipped;
            }
        };
        let id = match exposition_id(&url) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("unusable exposition URL {}: {}", url, e);
                return ExpoOutcome::Skipped;
            }
        };

        if force {
            if let Err(e) = self.store.remove(id) {
                tracing::warn!("failed to clear exposition {}: {}", id, e);
            }
        }

        let _lock = match self.store.try_lock(id) {
            Ok(lock) => lock,
            Err(WeaveError::Locked { .. }) => {
                tracing::info!("exposition {} is locked by another worker, skipping", id);
                return ExpoOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("cannot claim exposition {}: {}", id, e);
                return ExpoOutcome::Skipped;
            }
        };

        tracing::info!("parsing exposition {} at {}", id, url);
        let (exposition, outcome) = match self.process(id, &url, meta).await {
            Ok(exposition) => (exposition, ExpoOutcome::Completed),
            Err(e) => {
                tracing::error!("exposition {} failed: {}", id, e);
                let mut exposition = Exposition::new(id, &url);
                exposition.error = Some(e.to_string());
                (exposition, ExpoOutcome::Failed)
            }
        };

        if let Err(e) = self.persist(&exposition) {
            tracing::error!("failed to persist exposition {}: {}", id, e);
            return ExpoOutcome::Failed;
        }
        outcome
    }

    /// The per-exposition pipeline
    async fn process(&self, id: u64, url: &str, mut meta: ExpoMeta) -> Result<Exposition> {
        let fetcher = self.fetcher.as_ref();
        let platform = &self.config.platform;
        let base = Url::parse(&platform.base_url)?;

        let root_body = fetcher.fetch(url).await.into_body(url)?;
        if root_body.contains("Authentication required") {
            return Err(WeaveError::AuthRequired { id });
        }
        if root_body.contains("You do not have permissions to access this research!") {
            return Err(WeaveError::PermissionDenied { id });
        }

        let meta_url = match meta.meta_data_page.clone() {
            Some(existing) => existing,
            None => find_meta_link(&root_body, &base)
                .ok_or(WeaveError::MissingMetaLink { id })?,
        };

        // Feed entries arrive with full metadata; a single-URL crawl
        // fills it in from the meta page.
        if meta.title.is_none() && meta.last_modified.is_none() {
            meta = fetch_meta_page(fetcher, &meta_url).await?;
        }

        let copyrights = match fetch_copyrights(fetcher, &meta_url).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("copyrights unavailable for exposition {}: {}", id, e);
                Vec::new()
            }
        };

        let page_urls = discover_pages(fetcher, url, &root_body, &meta_url, &base).await;
        tracing::info!("exposition {}: found {} pages", id, page_urls.len());

        let mut exposition = Exposition::new(id, url);
        exposition.meta = meta;
        exposition.copyrights = copyrights;

        let exposition_base = format!("{}/view/{}", platform.base_url.trim_end_matches('/'), id);

        for (index, page_url) in page_urls.iter().enumerate() {
            let page_id = match page_number(page_url) {
                Ok(number) => number,
                Err(e) => {
                    tracing::warn!("skipping page with no number: {}", e);
                    continue;
                }
            };

            let fetch_url = clean_url(page_url).unwrap_or_else(|_| page_url.clone());
            let page = match fetcher.fetch(&fetch_url).await {
                FetchOutcome::Success { body, .. } => {
                    let document = Html::parse_document(&body);
                    let page = extract_page(&document, page_id, &exposition_base, platform);
                    tracing::info!(
                        "processed page {}/{}: {} ({})",
                        index + 1,
                        page_urls.len(),
                        page_url,
                        page.page_type
                    );
                    page
                }
                outcome => {
                    tracing::warn!("page fetch failed for {}: {:?}", page_url, outcome);
                    Page::bare(page_id, PageType::Undefined)
                }
            };

            exposition.pages.insert(page_id, page);
        }

        merge_copyrights(
            &mut exposition.pages,
            &exposition.copyrights,
            &mut NullResolver,
        );
        finalize(&mut exposition);

        Ok(exposition)
    }

    /// Writes the exposition record and updates the merged rollup
    fn persist(&self, exposition: &Exposition) -> Result<()> {
        self.store.write(exposition)?;

        let record = rollup(exposition);
        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stats.upsert(exposition.id, record)
    }
}
