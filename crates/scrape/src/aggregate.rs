use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::MetadataRecord;
use library::TitleScraper;
use metadata::is_valid_title;
use tracing::{debug, info, warn};

use crate::client::{ClientSettings, ScrapeClient, ScrapeError};
use crate::source::{build_sources, SourceKind, SourceScraper};

/// Pacing for the aggregator. Sources and codes are always visited one at a
/// time; these delays are the minimum gaps between requests.
#[derive(Clone, Debug)]
pub struct ScrapePolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub source_delay: Duration,
    pub batch_delay: Duration,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            source_delay: Duration::from_millis(500),
            batch_delay: Duration::from_secs(1),
        }
    }
}

/// Walks the ordered source list for each code and keeps the first title
/// that passes validation.
pub struct MetadataAggregator {
    sources: Vec<Box<dyn SourceScraper>>,
    policy: ScrapePolicy,
    cancel: Option<Arc<AtomicBool>>,
}

impl MetadataAggregator {
    pub fn new(sources: Vec<Box<dyn SourceScraper>>, policy: ScrapePolicy) -> Self {
        Self {
            sources,
            policy,
            cancel: None,
        }
    }

    pub fn from_settings(
        settings: &ClientSettings,
        kinds: &[SourceKind],
        policy: ScrapePolicy,
    ) -> Result<Self, ScrapeError> {
        let client = ScrapeClient::new(settings)?;
        Ok(Self::new(build_sources(&client, kinds), policy))
    }

    /// Checked between codes and between sources; once set, the current
    /// code gives up and the batch returns what it has.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| source.name().to_string())
            .collect()
    }

    pub fn scrape_one(&self, code: &str) -> Option<MetadataRecord> {
        let attempts = self.policy.max_retries.max(1);
        for (index, source) in self.sources.iter().enumerate() {
            if self.is_cancelled() {
                return None;
            }
            if index > 0 {
                pause(self.policy.source_delay);
            }
            for attempt in 1..=attempts {
                if attempt > 1 {
                    pause(self.policy.retry_delay);
                }
                match source.scrape(code) {
                    Some(hit) if is_valid_title(&hit.title) => {
                        info!(
                            "Found title for {} from {}: {}",
                            code,
                            source.name(),
                            preview(&hit.title)
                        );
                        return Some(MetadataRecord::with_date(hit.title, hit.date));
                    }
                    Some(hit) => {
                        warn!(
                            "{} returned an unusable title for {} (attempt {}/{}): {}",
                            source.name(),
                            code,
                            attempt,
                            attempts,
                            preview(&hit.title)
                        );
                    }
                    None => {
                        debug!(
                            "{} had no result for {} (attempt {}/{})",
                            source.name(),
                            code,
                            attempt,
                            attempts
                        );
                    }
                }
            }
        }
        None
    }

    /// Resolves codes strictly one after another with `batch_delay` between
    /// them. Output keeps the input order.
    pub fn scrape_batch(&self, codes: &[String]) -> Vec<(String, Option<MetadataRecord>)> {
        let mut results = Vec::with_capacity(codes.len());
        for (index, code) in codes.iter().enumerate() {
            if self.is_cancelled() {
                info!("Scrape cancelled after {}/{} codes", index, codes.len());
                break;
            }
            if index > 0 {
                pause(self.policy.batch_delay);
            }
            info!("Scraping {} ({}/{})", code, index + 1, codes.len());
            let record = self.scrape_one(code);
            results.push((code.clone(), record));
        }
        results
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl TitleScraper for MetadataAggregator {
    fn scrape_batch(&self, codes: &[String]) -> Vec<(String, Option<MetadataRecord>)> {
        MetadataAggregator::scrape_batch(self, codes)
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn preview(title: &str) -> String {
    let mut out: String = title.chars().take(50).collect();
    if title.chars().count() > 50 {
        out.push_str("...");
    }
    out
}
