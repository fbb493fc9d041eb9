//! Run-level counters and the final summary
//!
//! `CrawlStats` is the mutable tally owned by the orchestrator;
//! `CrawlSummary` is the immutable view handed to callers, available at
//! any time during the run and produced once at run end.
//!
//! Counting rules: a page is `processed` when its retried pipeline
//! reaches a terminal state (succeeded or abandoned). Pages skipped by
//! the politeness gate and pages cut off by cancellation are not
//! processed. Element-level accounting lives in `records_emitted` and
//! `records_rejected`.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mutable run counters
#[derive(Debug)]
pub struct CrawlStats {
    pages_processed: u64,
    pages_succeeded: u64,
    pages_failed: u64,
    records_emitted: u64,
    records_rejected: u64,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_processed: 0,
            pages_succeeded: 0,
            pages_failed: 0,
            records_emitted: 0,
            records_rejected: 0,
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Records a page whose pipeline succeeded
    pub fn record_success(&mut self, emitted: u64, rejected: u64) {
        self.pages_processed += 1;
        self.pages_succeeded += 1;
        self.records_emitted += emitted;
        self.records_rejected += rejected;
    }

    /// Records a page abandoned after exhausting its retries
    pub fn record_failure(&mut self) {
        self.pages_processed += 1;
        self.pages_failed += 1;
    }

    /// Immutable snapshot of the current counters
    pub fn snapshot(&self) -> CrawlSummary {
        let success_rate = if self.pages_processed == 0 {
            0.0
        } else {
            self.pages_succeeded as f64 / self.pages_processed as f64
        };

        CrawlSummary {
            pages_processed: self.pages_processed,
            pages_succeeded: self.pages_succeeded,
            pages_failed: self.pages_failed,
            records_emitted: self.records_emitted,
            records_rejected: self.records_rejected,
            success_rate,
            duration: self.started.elapsed(),
            started_at: self.started_at,
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, cloneable view of the live run counters
///
/// The orchestrator mutates through one clone while any other holder
/// can snapshot concurrently, so the counters stay observable for the
/// whole run, not only at its end.
#[derive(Clone)]
pub struct StatsHandle {
    inner: Arc<Mutex<CrawlStats>>,
}

impl StatsHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CrawlStats::new())),
        }
    }

    /// Immutable snapshot of the counters as they stand right now
    pub fn snapshot(&self) -> CrawlSummary {
        self.inner.lock().unwrap().snapshot()
    }

    pub(crate) fn record_success(&self, emitted: u64, rejected: u64) {
        self.inner.lock().unwrap().record_success(emitted, rejected);
    }

    pub(crate) fn record_failure(&self) {
        self.inner.lock().unwrap().record_failure();
    }
}

impl Default for StatsHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only summary of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub pages_processed: u64,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
    pub records_emitted: u64,
    pub records_rejected: u64,
    /// `pages_succeeded / pages_processed`; 0 when nothing was processed
    pub success_rate: f64,
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Pages:");
    println!("  Processed: {}", summary.pages_processed);
    println!("  Succeeded: {}", summary.pages_succeeded);
    println!("  Failed:    {}", summary.pages_failed);
    println!();

    println!("Records:");
    println!("  Emitted:  {}", summary.records_emitted);
    println!("  Rejected: {}", summary.records_rejected);
    println!();

    println!(
        "Success rate: {:.1}% over {:.1}s",
        summary.success_rate * 100.0,
        summary.duration.as_secs_f64()
    );
}
