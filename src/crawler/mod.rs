//! Crawl engine
//!
//! This module contains the core crawling logic, including:
//! - Per-page session acquisition with resource filtering
//! - Bounded retry with linear backoff
//! - The breadth-first frontier
//! - Overall crawl orchestration

mod coordinator;
mod frontier;
mod retry;
mod session;

pub use coordinator::{CrawlOutcome, Crawler};
pub use frontier::Frontier;
pub use retry::{run_with_retry, PageOutcome, PagePhase, RetryPolicy};
pub use session::{FetchedPage, PageSession, ResourceClass, ResourceFilter, SessionFactory};

use crate::config::{CrawlOptions, SiteConfig};
use crate::GleanerError;

/// Runs a complete crawl of one configured site
///
/// Convenience entry for callers that neither stream records nor cancel
/// mid-run.
///
/// # Arguments
///
/// * `site` - The target site description
/// * `options` - Crawl behavior options
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Accumulated records and the final statistics
/// * `Err(GleanerError)` - Initialization failed
pub async fn crawl(site: SiteConfig, options: CrawlOptions) -> Result<CrawlOutcome, GleanerError> {
    let mut crawler = Crawler::new(site, options)?;
    crawler.run().await
}
