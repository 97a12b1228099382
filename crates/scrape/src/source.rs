use common::ReleaseDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ScrapeClient;
use crate::sites::{SiteScraper, JAVDB, JAVLIBRARY};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeHit {
    pub title: String,
    pub date: Option<ReleaseDate>,
}

/// One external metadata site. `scrape` never fails loudly: network,
/// status and parse problems are logged by the implementation and come back
/// as `None`.
pub trait SourceScraper {
    fn name(&self) -> &str;
    fn scrape(&self, code: &str) -> Option<ScrapeHit>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Dmm,
    JavDb,
    JavLibrary,
}

/// Registry order. Earlier sources take precedence when several would match.
pub const DEFAULT_SOURCE_ORDER: &[SourceKind] =
    &[SourceKind::Dmm, SourceKind::JavDb, SourceKind::JavLibrary];

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Dmm => "DMM",
            SourceKind::JavDb => "JavDB",
            SourceKind::JavLibrary => "JavLibrary",
        }
    }

    /// DMM answers every request from outside its region with a block page,
    /// so it is never queried.
    pub fn is_blocked(self) -> bool {
        matches!(self, SourceKind::Dmm)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dmm" | "fanza" => Some(SourceKind::Dmm),
            "javdb" | "jav_db" => Some(SourceKind::JavDb),
            "javlibrary" | "jav_library" | "javlib" => Some(SourceKind::JavLibrary),
            _ => None,
        }
    }
}

/// Builds scrapers for `kinds` in the given order, dropping blocked sources
/// and duplicates.
pub fn build_sources(client: &ScrapeClient, kinds: &[SourceKind]) -> Vec<Box<dyn SourceScraper>> {
    let mut seen = Vec::new();
    let mut out: Vec<Box<dyn SourceScraper>> = Vec::new();
    for kind in kinds {
        if seen.contains(kind) {
            continue;
        }
        seen.push(*kind);
        if kind.is_blocked() {
            info!("Source {} is disabled (permanent block page)", kind.name());
            continue;
        }
        let profile = match kind {
            SourceKind::JavDb => &JAVDB,
            SourceKind::JavLibrary => &JAVLIBRARY,
            SourceKind::Dmm => continue,
        };
        out.push(Box::new(SiteScraper::new(profile, client.clone())));
    }
    out
}
