use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawl: CrawlOptions,
}

/// Immutable description of a target site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// First listing page of the crawl
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Field locators for record extraction
    pub selectors: Selectors,

    /// Locator that must match before a page counts as loaded
    #[serde(rename = "wait-condition", default)]
    pub wait_condition: Option<String>,
}

/// Field locators resolved against each listing page
#[derive(Debug, Clone, Deserialize)]
pub struct Selectors {
    /// Matches one element per record
    pub product: String,

    #[serde(default)]
    pub title: Option<Locator>,

    #[serde(default)]
    pub price: Option<Locator>,

    /// Defaults to the `src` attribute when no attribute is given
    #[serde(default)]
    pub image: Option<Locator>,

    /// Open-ended per-field locators, keyed by output field name
    #[serde(default)]
    pub custom: BTreeMap<String, Locator>,

    /// Pagination link; defaults to the `href` attribute
    #[serde(rename = "next-page", default)]
    pub next_page: Option<Locator>,
}

/// Declarative locator descriptor
///
/// Either a bare CSS selector, which resolves to the matched element's
/// text content, or a selector paired with an attribute name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Css(String),
    Detailed {
        selector: String,
        #[serde(default)]
        attr: Option<String>,
    },
}

impl Locator {
    /// The CSS selector of this locator
    pub fn selector(&self) -> &str {
        match self {
            Self::Css(selector) => selector,
            Self::Detailed { selector, .. } => selector,
        }
    }

    /// The attribute to read, if one was configured
    pub fn attr(&self) -> Option<&str> {
        match self {
            Self::Css(_) => None,
            Self::Detailed { attr, .. } => attr.as_deref(),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlOptions {
    /// Politeness delay between consecutive page requests (milliseconds);
    /// also the base delay of the linear retry backoff
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Additional attempts after the first failure of a page
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Navigation timeout per request (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// User agent sent with every request and matched against robots.txt
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Optional HTTP(S) proxy URL
    #[serde(default)]
    pub proxy: Option<String>,
}
