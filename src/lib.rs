//! Weavemap: an exposition crawler and layout mapper
//!
//! This crate crawls multi-page research expositions, extracts the
//! positioned content elements ("tools") of every page, scores the layout
//! of graphical pages, categorizes outbound links, and decides
//! incrementally which expositions need re-crawling.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod media;
pub mod model;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for weavemap operations
#[derive(Debug, Error)]
pub enum WeaveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Authentication required for exposition {id}")]
    AuthRequired { id: u64 },

    #[error("No permission to access exposition {id}")]
    PermissionDenied { id: u64 },

    #[error("Exposition {id} has no meta page link")]
    MissingMetaLink { id: u64 },

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Exposition {id} is locked by another worker")]
    Locked { id: u64 },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while extracting tools and geometry from a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed geometry in style '{style}': {message}")]
    MalformedGeometry { style: String, message: String },

    #[error("Expected element missing: {0}")]
    MissingElement(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no exposition id segment: {0}")]
    MissingExpositionId(String),

    #[error("URL has no page segment: {0}")]
    MissingPageSegment(String),
}

/// Result type alias for weavemap operations
pub type Result<T> = std::result::Result<T, WeaveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Exposition, LinkCategory, Page, PageType, Rect, Tool, ToolKind};
pub use state::{StalenessDecision, StalenessMode};
