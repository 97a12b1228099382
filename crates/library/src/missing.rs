use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::ReconcileError;
use crate::Library;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ArtistMissing {
    pub missing_count: usize,
    pub missing_codes: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MissingSummary {
    pub missing_count: usize,
    pub missing_codes: Vec<String>,
    pub total_videos: usize,
    pub titled_videos: usize,
}

impl Library {
    /// Codes found on disk with no catalog entry, in scan order.
    pub fn find_missing(&self, artist: &str) -> Result<Vec<String>, ReconcileError> {
        let scan = self.scan(artist)?;
        let titled = self.catalog().codes(artist);
        Ok(scan
            .codes
            .into_iter()
            .filter(|code| !titled.contains(code))
            .collect())
    }

    pub fn missing(&self, artist: &str) -> Result<ArtistMissing, ReconcileError> {
        let missing_codes = self.find_missing(artist)?;
        Ok(ArtistMissing {
            missing_count: missing_codes.len(),
            missing_codes,
        })
    }

    /// Per-artist missing counts; artists with nothing missing are left out.
    pub fn summary(&self) -> Result<BTreeMap<String, MissingSummary>, ReconcileError> {
        let mut out = BTreeMap::new();
        for artist in self.artists()? {
            let scan = match self.scan(&artist) {
                Ok(scan) => scan,
                Err(err) => {
                    warn!("Skipping artist {} in summary: {}", artist, err);
                    continue;
                }
            };
            let titled = self.catalog().codes(&artist);
            let total_videos = scan.len();
            let missing_codes: Vec<String> = scan
                .codes
                .into_iter()
                .filter(|code| !titled.contains(code))
                .collect();
            if missing_codes.is_empty() {
                continue;
            }
            out.insert(
                artist,
                MissingSummary {
                    missing_count: missing_codes.len(),
                    missing_codes,
                    total_videos,
                    titled_videos: titled.len(),
                },
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_code(root: &std::path::Path, artist: &str, code: &str) {
        let dir = root.join(artist).join(code);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("video.mp4"), b"x").unwrap();
    }

    #[test]
    fn missing_is_scan_minus_catalog() {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Foo", "CODE-001");
        make_code(dir.path(), "Foo", "CODE-002");
        fs::write(dir.path().join("Foo/title.json"), r#"{"Foo": {"CODE-002": "Bar"}}"#).unwrap();

        let library = Library::new(dir.path().to_path_buf());
        assert_eq!(library.find_missing("Foo").unwrap(), vec!["CODE-001".to_string()]);
        let missing = library.missing("Foo").unwrap();
        assert_eq!(missing.missing_count, 1);
    }

    #[test]
    fn unknown_artist_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new(dir.path().to_path_buf());
        assert!(library.find_missing("Nobody").unwrap_err().is_not_found());
        assert!(library.find_missing("../etc").unwrap_err().is_not_found());
    }

    #[test]
    fn padded_artist_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Foo", "CODE-001");
        make_code(dir.path(), "Foo", "CODE-002");
        fs::write(dir.path().join("Foo/title.json"), r#"{"Foo": {"CODE-002": "Bar"}}"#).unwrap();

        let library = Library::new(dir.path().to_path_buf());
        assert!(library.find_missing("Foo ").unwrap_err().is_not_found());
        assert!(library.find_missing(" Foo").unwrap_err().is_not_found());
        assert_eq!(library.find_missing("Foo").unwrap(), vec!["CODE-001".to_string()]);
    }

    #[test]
    fn unreadable_catalog_entry_counts_as_titled() {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Foo", "A-1");
        make_code(dir.path(), "Foo", "A-2");
        fs::write(dir.path().join("Foo/title.json"), r#"{"Foo": {"A-1": ["odd"]}}"#).unwrap();

        let library = Library::new(dir.path().to_path_buf());
        assert_eq!(library.find_missing("Foo").unwrap(), vec!["A-2".to_string()]);
        let summary = library.summary().unwrap();
        assert_eq!(summary["Foo"].titled_videos, 1);
    }

    #[test]
    fn summary_skips_complete_artists() {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Done", "A-1");
        fs::write(dir.path().join("Done/title.json"), r#"{"A-1": "Titled"}"#).unwrap();
        make_code(dir.path(), "Todo", "B-1");
        make_code(dir.path(), "Todo", "B-2");
        fs::write(dir.path().join("Todo/title.json"), r#"{"Todo": {"B-2": "Titled"}}"#).unwrap();

        let library = Library::new(dir.path().to_path_buf());
        let summary = library.summary().unwrap();
        assert_eq!(summary.len(), 1);
        let todo = &summary["Todo"];
        assert_eq!(todo.missing_codes, vec!["B-1".to_string()]);
        assert_eq!(todo.total_videos, 2);
        assert_eq!(todo.titled_videos, 1);
    }
}
