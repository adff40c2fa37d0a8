use serde::Deserialize;

/// Main configuration structure for weavemap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub platform: PlatformConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub staleness: StalenessConfig,
    pub output: OutputConfig,
}

/// Identity of the publishing platform being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform (exposition pages live under /view/)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Base URL of the platform's media server; links into it are media
    /// assets, not pages, and are dropped by the link categorizer
    #[serde(rename = "media-url")]
    pub media_url: String,

    /// Endpoint serving the JSON feed of all public expositions
    #[serde(rename = "feed-url")]
    pub feed_url: String,

    /// DOI namespace token assigned to the platform
    #[serde(rename = "doi-token")]
    pub doi_token: String,
}

impl PlatformConfig {
    /// The platform's registrable domain, without any `www.` prefix
    pub fn domain(&self) -> String {
        let host = url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of expositions processed concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Maximum in-flight HTTP requests shared across all workers
    #[serde(rename = "max-in-flight")]
    pub max_in_flight: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Retries on transient failures (connect error, timeout, 5xx)
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Staleness decision configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StalenessConfig {
    /// Skew tolerance added to the local timestamp before comparing with
    /// the remote last-modified time (seconds)
    #[serde(rename = "tolerance-secs", default = "default_tolerance")]
    pub tolerance_secs: i64,

    /// Age beyond which a local record is re-crawled in resume mode
    /// (seconds)
    #[serde(rename = "resume-window-secs", default = "default_resume_window")]
    pub resume_window_secs: i64,
}

fn default_tolerance() -> i64 {
    86_400 // one day
}

fn default_resume_window() -> i64 {
    259_200 // three days
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance(),
            resume_window_secs: default_resume_window(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one folder per crawled exposition
    #[serde(rename = "research-dir")]
    pub research_dir: String,

    /// Path of the merged rollup statistics file
    #[serde(rename = "stats-path")]
    pub stats_path: String,
}
