//! Streaming record sinks
//!
//! A sink receives each page's records as soon as the page completes,
//! in frontier-dequeue order, instead of waiting for the whole run. A
//! downstream consumer typically persists or deduplicates the records;
//! neither happens here.

use crate::extract::ExtractedRecord;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Consumer of per-page record batches
///
/// Invoked once per successfully processed page. Batches may be empty.
/// Errors are logged by the orchestrator and never abort the crawl.
#[async_trait]
pub trait RecordSink: Send {
    async fn emit(&mut self, batch: &[ExtractedRecord]) -> anyhow::Result<()>;
}

/// Default sink: discards every batch
pub struct NoopSink;

#[async_trait]
impl RecordSink for NoopSink {
    async fn emit(&mut self, _batch: &[ExtractedRecord]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes records as newline-delimited JSON
pub struct NdjsonSink<W: Write + Send> {
    writer: W,
}

impl NdjsonSink<BufWriter<File>> {
    /// Creates a sink writing to a file at the given path
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for NdjsonSink<W> {
    async fn emit(&mut self, batch: &[ExtractedRecord]) -> anyhow::Result<()> {
        for record in batch {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        // Flush per batch so records survive an interrupted run
        self.writer.flush()?;
        Ok(())
    }
}
