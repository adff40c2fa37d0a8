//! HTTP fetcher implementation
//!
//! The pipeline treats fetching as an opaque capability behind the
//! [`PageFetcher`] trait; this module also provides the production
//! implementation built on reqwest, with per-request timeouts, a
//! user-agent assembled from config, per-host rate limiting, and bounded
//! retries on transient failures.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::limiter::HostLimiter;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Delay between retries of a transient failure
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Non-2xx response that is not retried (404 and other 4xx)
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Network-level failure after all retries were exhausted
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchOutcome {
    /// Unwraps a successful body, mapping failures to a fetch error
    pub fn into_body(self, url: &str) -> crate::Result<String> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::HttpError { status } => Err(crate::WeaveError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Self::NetworkError { error } => Err(crate::WeaveError::Fetch {
                url: url.to_string(),
                message: error,
            }),
        }
    }
}

/// The page-fetch capability the pipeline is built against
///
/// Network fetches are the pipeline's only suspension points; every
/// implementation must carry its own timeout.
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL and returns its outcome
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout_secs` - Per-request timeout in seconds
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production fetcher: reqwest client + shared host limiter + retries
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<HostLimiter>,
    retry_attempts: u32,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler configuration
    pub fn new(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler.fetch_timeout_secs)?;
        let limiter = Arc::new(HostLimiter::new(
            crawler.max_in_flight as usize,
            Duration::from_millis(crawler.request_delay_ms),
        ));
        Ok(Self {
            client,
            limiter,
            retry_attempts: crawler.retry_attempts,
        })
    }

    /// Classifies a response or error and decides whether to retry
    ///
    /// | Condition          | Action                      |
    /// |--------------------|-----------------------------|
    /// | 2xx                | Success                     |
    /// | 5xx                | Retry, then NetworkError    |
    /// | Timeout            | Retry, then NetworkError    |
    /// | Connection refused | Retry, then NetworkError    |
    /// | Other 4xx          | Immediate HttpError         |
    async fn fetch_once(&self, url: &str) -> Result<FetchOutcome, String> {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    return Err(format!("HTTP {}", status.as_u16()));
                }

                if !status.is_success() {
                    return Ok(FetchOutcome::HttpError {
                        status: status.as_u16(),
                    });
                }

                match response.text().await {
                    Ok(body) => Ok(FetchOutcome::Success {
                        status: status.as_u16(),
                        body,
                    }),
                    Err(e) => Err(format!("body read failed: {}", e)),
                }
            }
            Err(e) if e.is_timeout() => Err("request timeout".to_string()),
            Err(e) if e.is_connect() => Err("connection failed".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let _permit = self.limiter.acquire(&host).await;

        let mut last_error = String::new();
        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                tracing::debug!("retry {}/{} for {}", attempt, self.retry_attempts, url);
                tokio::time::sleep(RETRY_DELAY).await;
                self.limiter.wait_for_host(&host).await;
            }

            match self.fetch_once(url).await {
                Ok(outcome) => return outcome,
                Err(transient) => last_error = transient,
            }
        }

        FetchOutcome::NetworkError { error: last_error }
    }
}
