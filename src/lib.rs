//! Gleaner: a configurable listing crawler and extraction engine
//!
//! This crate crawls product-listing pages described by a site configuration
//! (start URL, field locators, pagination rule), respecting robots.txt and a
//! politeness delay, and turns matched elements into normalized records that
//! are streamed to a consumer as each page completes.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;

use thiserror::Error;

/// Main error type for Gleaner operations
///
/// Only initialization-class failures surface from a run; page-level
/// problems are retried, logged, and folded into the run statistics.
#[derive(Debug, Error)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize the HTTP engine: {0}")]
    Init(#[source] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

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

    #[error("Invalid selector for '{name}': {message}")]
    InvalidSelector { name: String, message: String },
}

/// Errors raised while acquiring or loading a single page
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Expected HTML for {url}, got {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("Resource class {class:?} blocked by filter: {url}")]
    BlockedResource {
        url: String,
        class: crawler::ResourceClass,
    },

    #[error("Wait condition '{selector}' not satisfied for {url}")]
    WaitCondition { url: String, selector: String },
}

/// Failure of one attempt at a page's acquire/navigate/extract pipeline
///
/// This is the retried unit: any variant is eligible for another attempt
/// until the retry budget is exhausted and the page is abandoned.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Failed to open session for {url}: {source}")]
    Acquisition {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlOptions, Locator, Selectors, SiteConfig};
pub use crawler::{crawl, CrawlOutcome, Crawler};
pub use extract::ExtractedRecord;
pub use output::{CrawlStats, CrawlSummary, NdjsonSink, NoopSink, RecordSink, StatsHandle};
