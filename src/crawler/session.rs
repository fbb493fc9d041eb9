//! Page acquisition
//!
//! Every page is loaded through a fresh, isolated session: its own HTTP
//! client with its own cookie jar, so state never leaks between pages.
//! A session consults the resource filter before downloading a response
//! body and is released on drop, on every exit path.

use crate::config::CrawlOptions;
use crate::NavigationError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Upper bound on waiting for a wait-condition locator to appear
const WAIT_CONDITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between wait-condition polls
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Coarse classification of a fetched resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Document,
    Image,
    Font,
    Media,
    Script,
    Stylesheet,
    Other,
}

impl ResourceClass {
    /// Classifies from a Content-Type header value
    pub fn from_content_type(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if value.contains("text/html") || value.contains("application/xhtml") {
            Self::Document
        } else if value.starts_with("image/") {
            Self::Image
        } else if value.starts_with("font/") || value.contains("application/font") {
            Self::Font
        } else if value.starts_with("audio/") || value.starts_with("video/") {
            Self::Media
        } else if value.contains("javascript") {
            Self::Script
        } else if value.contains("text/css") {
            Self::Stylesheet
        } else {
            Self::Other
        }
    }

    /// Fallback classification from a URL's path extension
    pub fn from_url(url: &Url) -> Self {
        let extension = url
            .path()
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif") => Self::Image,
            Some("woff" | "woff2" | "ttf" | "otf" | "eot") => Self::Font,
            Some("mp3" | "mp4" | "webm" | "ogg" | "wav" | "avi" | "mov") => Self::Media,
            Some("js" | "mjs") => Self::Script,
            Some("css") => Self::Stylesheet,
            Some("html" | "htm" | "php" | "asp" | "aspx") | None => Self::Document,
            Some(_) => Self::Other,
        }
    }
}

/// Suppresses download of non-essential resource classes
///
/// Blocking is a latency and bandwidth measure, not a correctness one:
/// blocked classes are aborted after the response headers arrive, before
/// the body transfer.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    blocked: HashSet<ResourceClass>,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self {
            blocked: HashSet::from([
                ResourceClass::Image,
                ResourceClass::Font,
                ResourceClass::Media,
            ]),
        }
    }
}

impl ResourceFilter {
    /// A filter that blocks nothing
    pub fn permissive() -> Self {
        Self {
            blocked: HashSet::new(),
        }
    }

    pub fn blocks(&self, class: ResourceClass) -> bool {
        self.blocked.contains(&class)
    }
}

/// Builds isolated per-page sessions
///
/// Constructing the factory probes the client configuration once; a
/// failure here (bad proxy URL, TLS backend unavailable) is the fatal
/// initialization error, the only class that aborts a run.
pub struct SessionFactory {
    options: CrawlOptions,
    filter: ResourceFilter,
}

impl SessionFactory {
    pub fn new(options: CrawlOptions) -> Result<Self, reqwest::Error> {
        let factory = Self {
            options,
            filter: ResourceFilter::default(),
        };
        factory.build_client()?;
        Ok(factory)
    }

    /// Opens a session with a fresh cookie jar and the default
    /// navigation timeout
    pub fn open_session(&self) -> Result<PageSession, reqwest::Error> {
        Ok(PageSession {
            client: self.build_client()?,
            filter: self.filter.clone(),
        })
    }

    fn build_client(&self) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(self.options.user_agent.clone())
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        if let Some(proxy) = &self.options.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }

        builder.build()
    }
}

/// One isolated browsing session
///
/// Owns its HTTP client; dropping the session at scope exit releases the
/// underlying connections whether the page succeeded, failed validation,
/// or errored mid-flight.
pub struct PageSession {
    client: Client,
    filter: ResourceFilter,
}

impl PageSession {
    /// Loads a URL, optionally waiting for a locator to appear
    ///
    /// When `wait_condition` is set and the document does not yet match
    /// it, the URL is re-polled until the locator appears or a fixed
    /// 10 second bound elapses.
    pub async fn navigate(
        &self,
        url: &Url,
        wait_condition: Option<&str>,
    ) -> Result<FetchedPage, NavigationError> {
        let deadline = tokio::time::Instant::now() + WAIT_CONDITION_TIMEOUT;
        let mut page = self.fetch(url).await?;

        if let Some(selector) = wait_condition {
            while !selector_present(&page.body, selector) {
                if tokio::time::Instant::now() >= deadline {
                    return Err(NavigationError::WaitCondition {
                        url: url.to_string(),
                        selector: selector.to_string(),
                    });
                }
                tracing::trace!(%url, selector, "wait condition not met, polling again");
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
                page = self.fetch(url).await?;
            }
        }

        Ok(page)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    async fn fetch(&self, url: &Url) -> Result<FetchedPage, NavigationError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Abort blocked classes before the body transfer
        let class = if content_type.is_empty() {
            ResourceClass::from_url(url)
        } else {
            ResourceClass::from_content_type(&content_type)
        };
        if self.filter.blocks(class) {
            return Err(NavigationError::BlockedResource {
                url: url.to_string(),
                class,
            });
        }

        if !content_type.is_empty() && class != ResourceClass::Document {
            return Err(NavigationError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// A successfully loaded page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; base for relative resolution
    pub final_url: Url,
    pub status: u16,
    pub body: String,
}

fn classify_transport_error(url: &Url, error: reqwest::Error) -> NavigationError {
    if error.is_timeout() {
        NavigationError::Timeout {
            url: url.to_string(),
        }
    } else {
        NavigationError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

fn selector_present(html: &str, selector: &str) -> bool {
    let Ok(parsed) = Selector::parse(selector) else {
        // Malformed wait selectors are rejected at config load; treat as
        // satisfied rather than spinning until the deadline
        tracing::warn!(selector, "unparsable wait condition, skipping wait");
        return true;
    };
    let document = Html::parse_document(html);
    document.select(&parsed).next().is_some()
}
