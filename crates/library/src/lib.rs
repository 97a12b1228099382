mod catalog;
mod error;
mod missing;
mod reconcile;
mod scan;

use std::path::{Path, PathBuf};

pub use catalog::{TitleCatalogStore, DEFAULT_CATALOG_FILE};
pub use error::{CatalogError, ReconcileError};
pub use missing::{ArtistMissing, MissingSummary};
pub use reconcile::{ArtistOutcome, ReconciliationService, TitleScraper, UpdateOutcome};
pub use scan::{list_artists, scan_artist, ScanResult};

/// An artists directory on disk plus the per-artist title catalogs stored
/// inside it (`<root>/<artist>/title.json`).
#[derive(Clone)]
pub struct Library {
    root: PathBuf,
    catalog: TitleCatalogStore,
}

impl Library {
    pub fn new(root: PathBuf) -> Self {
        Self::with_catalog_file(root, DEFAULT_CATALOG_FILE)
    }

    pub fn with_catalog_file(root: PathBuf, catalog_file: &str) -> Self {
        let catalog = TitleCatalogStore::new(root.clone(), catalog_file);
        Self { root, catalog }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &TitleCatalogStore {
        &self.catalog
    }

    pub fn artist_dir(&self, artist: &str) -> PathBuf {
        self.root.join(artist)
    }

    /// Artist names are plain directory names, used exactly as given for
    /// both the scan and the catalog. Anything that could escape the root,
    /// or that differs from its trimmed form, is rejected as not found.
    pub fn require_artist(&self, artist: &str) -> Result<PathBuf, ReconcileError> {
        if artist.is_empty()
            || artist != artist.trim()
            || artist == "."
            || artist == ".."
            || artist.contains('/')
            || artist.contains('\\')
        {
            return Err(ReconcileError::NotFound(artist.to_string()));
        }
        let dir = self.artist_dir(artist);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(ReconcileError::NotFound(artist.to_string()))
        }
    }

    pub fn artists(&self) -> Result<Vec<String>, ReconcileError> {
        if !self.root.is_dir() {
            return Err(ReconcileError::NotFound(self.root.display().to_string()));
        }
        Ok(list_artists(&self.root)?)
    }

    pub fn scan(&self, artist: &str) -> Result<ScanResult, ReconcileError> {
        let dir = self.require_artist(artist)?;
        Ok(scan_artist(&dir)?)
    }
}
