//! Configuration loading and validation
//!
//! The site description and crawl options are loaded from a TOML file,
//! validated eagerly (including CSS selector syntax), and treated as
//! immutable for the lifetime of a run.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlOptions, Locator, Selectors, SiteConfig};
pub use validation::validate;
