//! Run reporting and record emission

mod sink;
mod stats;

pub use sink::{NdjsonSink, NoopSink, RecordSink};
pub use stats::{print_summary, CrawlStats, CrawlSummary, StatsHandle};
