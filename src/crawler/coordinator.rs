//! Crawl orchestration
//!
//! The `Crawler` owns the frontier, the run statistics, the session
//! factory, and the politeness gate for the duration of one run. Pages
//! are processed strictly one at a time: a page's full pipeline finishes
//! before the next begins, which bounds the load placed on the target
//! site to a single open session.

use crate::config::{CrawlOptions, SiteConfig};
use crate::crawler::frontier::Frontier;
use crate::crawler::retry::{run_with_retry, PageOutcome, PagePhase, RetryPolicy};
use crate::crawler::session::SessionFactory;
use crate::extract::{extract_page, ExtractedRecord, PageHarvest};
use crate::output::{CrawlSummary, NoopSink, RecordSink, StatsHandle};
use crate::robots::PolicyGate;
use crate::{GleanerError, PageError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a completed run
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Accumulated records in frontier-dequeue order
    pub records: Vec<ExtractedRecord>,

    /// Final run statistics
    pub stats: CrawlSummary,
}

/// Top-level crawl orchestrator
pub struct Crawler {
    site: SiteConfig,
    options: CrawlOptions,
    start_url: Url,
    factory: SessionFactory,
    frontier: Frontier,
    stats: StatsHandle,
    sink: Box<dyn RecordSink>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler for one site
    ///
    /// This is the only place a run can fail hard: an unparsable start
    /// URL or an HTTP engine that cannot be constructed (for example a
    /// malformed proxy) aborts before any request is made.
    pub fn new(site: SiteConfig, options: CrawlOptions) -> Result<Self, GleanerError> {
        let start_url = Url::parse(&site.start_url)?;
        let factory = SessionFactory::new(options.clone()).map_err(GleanerError::Init)?;

        Ok(Self {
            site,
            options,
            start_url: start_url.clone(),
            factory,
            frontier: Frontier::new(start_url),
            stats: StatsHandle::new(),
            sink: Box::new(NoopSink),
            cancel: CancellationToken::new(),
        })
    }

    /// Installs a streaming sink, invoked once per successful page
    pub fn with_sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Handle that stops the run when triggered
    ///
    /// Cancellation is observed at every suspension point: the politeness
    /// delay, retry backoff, and in-flight navigation. Teardown is the
    /// same as for normal completion.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Point-in-time view of the run counters
    pub fn stats(&self) -> CrawlSummary {
        self.stats.snapshot()
    }

    /// Cloneable handle for observing the counters while the run is in
    /// flight, for example from the task driving a progress display
    pub fn stats_handle(&self) -> StatsHandle {
        self.stats.clone()
    }

    /// Runs the crawl to completion
    ///
    /// Page-level failures are retried, then folded into the statistics;
    /// a run where every page fails still returns a normal outcome with
    /// `failed == processed` and no records.
    pub async fn run(&mut self) -> Result<CrawlOutcome, GleanerError> {
        tracing::info!(site = %self.start_url, "starting crawl");

        // Politeness directives are best effort and never block the run
        let probe = self.factory.open_session().map_err(GleanerError::Init)?;
        let policy = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => PolicyGate::allow_all(&self.options.user_agent),
            gate = PolicyGate::load(probe.client(), &self.start_url, &self.options.user_agent) => gate,
        };
        drop(probe);

        let delay = effective_delay(&self.options, &policy);
        let retry = RetryPolicy::new(
            self.options.max_retries,
            Duration::from_millis(self.options.delay_ms),
        );

        let mut records = Vec::new();
        let mut first_request = true;

        while let Some(url) = self.frontier.next() {
            if self.cancel.is_cancelled() {
                tracing::info!("cancellation observed, stopping crawl");
                break;
            }

            // Politeness delay before every request after the first
            if !first_request && !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            first_request = false;

            if !policy.is_allowed(&url) {
                // Skipped, not failed: the gate ruling is final, no retry
                tracing::warn!(%url, "URL disallowed by crawl policy, skipping");
                continue;
            }

            let factory = &self.factory;
            let site = &self.site;
            let outcome =
                run_with_retry(retry, &self.cancel, |attempt| {
                    process_page(factory, site, &url, attempt)
                })
                .await;

            match outcome {
                PageOutcome::Succeeded(harvest) => {
                    self.stats
                        .record_success(harvest.records.len() as u64, harvest.rejected);

                    if let Err(e) = self.sink.emit(&harvest.records).await {
                        tracing::error!(%url, error = %e, "record sink failed, continuing");
                    }
                    records.extend(harvest.records);

                    if let Some(next) = harvest.next_page {
                        if self.frontier.enqueue(next.clone()) {
                            tracing::debug!(next = %next, "queued next page");
                        } else {
                            tracing::debug!(next = %next, "next page already seen, dropping");
                        }
                    }
                }
                PageOutcome::Abandoned {
                    attempts,
                    last_error,
                } => {
                    self.stats.record_failure();
                    tracing::error!(
                        %url,
                        attempts,
                        error = %last_error,
                        phase = ?PagePhase::Abandoned,
                        "page abandoned"
                    );
                }
                PageOutcome::Cancelled => {
                    tracing::info!(%url, "cancellation observed mid-page, stopping crawl");
                    break;
                }
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            processed = stats.pages_processed,
            succeeded = stats.pages_succeeded,
            failed = stats.pages_failed,
            records = stats.records_emitted,
            "crawl finished"
        );

        Ok(CrawlOutcome { records, stats })
    }
}

/// One attempt at the full acquire/navigate/extract pipeline
///
/// Opens a fresh isolated session for the attempt; the session is
/// dropped on return, so teardown holds on the error paths as well.
async fn process_page(
    factory: &SessionFactory,
    site: &SiteConfig,
    url: &Url,
    attempt: u32,
) -> Result<PageHarvest, PageError> {
    tracing::debug!(%url, attempt, phase = ?PagePhase::Acquiring, "opening page session");
    let session = factory
        .open_session()
        .map_err(|e| PageError::Acquisition {
            url: url.to_string(),
            source: e,
        })?;

    let page = session
        .navigate(url, site.wait_condition.as_deref())
        .await?;

    tracing::debug!(
        %url,
        final_url = %page.final_url,
        phase = ?PagePhase::Extracting,
        "extracting records"
    );
    let harvest = extract_page(&page.body, &page.final_url, &site.selectors).map_err(|message| {
        PageError::Extraction {
            url: url.to_string(),
            message,
        }
    })?;

    tracing::debug!(
        %url,
        records = harvest.records.len(),
        rejected = harvest.rejected,
        phase = ?PagePhase::Succeeded,
        "page processed"
    );
    Ok(harvest)
}

/// Effective politeness delay: the configured floor, raised by the
/// site's crawl-delay directive when one applies
fn effective_delay(options: &CrawlOptions, policy: &PolicyGate) -> Duration {
    let configured = Duration::from_millis(options.delay_ms);
    match policy.crawl_delay() {
        Some(robots_delay) => configured.max(robots_delay),
        None => configured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Locator, Selectors};
    use std::collections::BTreeMap;

    fn test_site() -> SiteConfig {
        SiteConfig {
            start_url: "https://shop.example.com/listings".to_string(),
            selectors: Selectors {
                product: "li.product".to_string(),
                title: Some(Locator::Css("h2".to_string())),
                price: Some(Locator::Css(".price".to_string())),
                image: None,
                custom: BTreeMap::new(),
                next_page: None,
            },
            wait_condition: None,
        }
    }

    fn test_options() -> CrawlOptions {
        CrawlOptions {
            delay_ms: 0,
            max_retries: 0,
            timeout_ms: 30_000,
            user_agent: "gleaner-test/1.0".to_string(),
            proxy: None,
        }
    }

    #[test]
    fn test_new_crawler() {
        let crawler = Crawler::new(test_site(), test_options()).unwrap();
        let stats = crawler.stats();
        assert_eq!(stats.pages_processed, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_new_rejects_bad_start_url() {
        let mut site = test_site();
        site.start_url = "not a url".to_string();
        assert!(Crawler::new(site, test_options()).is_err());
    }

    #[test]
    fn test_effective_delay_uses_configured_floor() {
        let mut options = test_options();
        options.delay_ms = 1500;
        let gate = PolicyGate::allow_all("gleaner-test/1.0");
        assert_eq!(
            effective_delay(&options, &gate),
            Duration::from_millis(1500)
        );
    }
}
