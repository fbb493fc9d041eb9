//! Extraction pipeline: fetched pages to validated, normalized records
//!
//! Extraction is synchronous and deterministic over a fetched document:
//! running it twice against the same content yields the same record
//! sequence, in DOM encounter order.

mod normalize;
mod pipeline;

pub use normalize::{normalize_price, normalize_text, resolve_url};
pub use pipeline::{extract_page, PageHarvest};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One normalized record, created per matched element
///
/// Never mutated after creation. Every record carries at least a title
/// or a price; elements yielding neither are dropped before this type
/// is constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRecord {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub custom_fields: BTreeMap<String, Option<String>>,
    pub scraped_at: DateTime<Utc>,
    pub source_url: String,
}

impl ExtractedRecord {
    /// A record is kept only when it has a title or a price
    pub fn is_valid(&self) -> bool {
        self.title.is_some() || self.price.is_some()
    }
}
