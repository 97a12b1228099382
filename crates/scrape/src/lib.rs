//! Title and release-date lookup against external metadata sites.
//!
//! Scraping is best-effort: every site is parsed with ordered lists of
//! CSS selectors and any failure degrades to "no result" for that source.

mod aggregate;
mod client;
mod sites;
mod source;

pub use aggregate::{MetadataAggregator, ScrapePolicy};
pub use client::{url_escape, ClientSettings, ScrapeClient, ScrapeError};
pub use source::{build_sources, ScrapeHit, SourceKind, SourceScraper, DEFAULT_SOURCE_ORDER};
