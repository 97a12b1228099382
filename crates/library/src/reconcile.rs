use std::collections::BTreeMap;

use common::{MetadataRecord, StoredEntry};
use metadata::normalize_code;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ReconcileError;
use crate::Library;

/// Batch lookup of titles for a list of codes. Implementations resolve codes
/// one after another and never fail as a whole; an unresolved code maps to
/// `None`.
pub trait TitleScraper {
    fn scrape_batch(&self, codes: &[String]) -> Vec<(String, Option<MetadataRecord>)>;
}

impl<T: TitleScraper + ?Sized> TitleScraper for &T {
    fn scrape_batch(&self, codes: &[String]) -> Vec<(String, Option<MetadataRecord>)> {
        (**self).scrape_batch(codes)
    }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub scraped: BTreeMap<String, MetadataRecord>,
    pub placeholder_applied: Vec<String>,
    pub still_missing: Vec<String>,
}

impl UpdateOutcome {
    pub fn updated_count(&self) -> usize {
        self.scraped.len() + self.placeholder_applied.len()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtistOutcome {
    Updated(UpdateOutcome),
    Failed { error: String },
}

/// Fills missing catalog entries, by scraping and/or with a placeholder
/// title, and persists them in one merge per artist.
pub struct ReconciliationService<S> {
    library: Library,
    scraper: S,
}

impl<S: TitleScraper> ReconciliationService<S> {
    pub fn new(library: Library, scraper: S) -> Self {
        Self { library, scraper }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn update_artist(
        &self,
        artist: &str,
        placeholder: Option<&str>,
        scrape_real: bool,
    ) -> Result<UpdateOutcome, ReconcileError> {
        let missing = self.library.find_missing(artist)?;
        let mut outcome = UpdateOutcome::default();
        if missing.is_empty() {
            return Ok(outcome);
        }
        info!("{}: {} codes without a title", artist, missing.len());

        let mut unresolved = Vec::new();
        let mut skipped = Vec::new();
        if scrape_real {
            // A cancelled batch returns fewer codes. Codes it never reached
            // stay missing and get no placeholder.
            let mut results: BTreeMap<String, Option<MetadataRecord>> =
                self.scraper.scrape_batch(&missing).into_iter().collect();
            for code in missing {
                match results.remove(&code) {
                    Some(Some(record)) => {
                        outcome.scraped.insert(code, record.resolved());
                    }
                    Some(None) => unresolved.push(code),
                    None => skipped.push(code),
                }
            }
            if !skipped.is_empty() {
                info!("{}: scrape stopped early, {} codes not attempted", artist, skipped.len());
            }
        } else {
            unresolved = missing;
        }

        let placeholder = placeholder.map(str::trim).filter(|value| !value.is_empty());
        match placeholder {
            Some(_) => outcome.placeholder_applied = unresolved,
            None => outcome.still_missing = unresolved,
        }
        outcome.still_missing.extend(skipped);

        if outcome.updated_count() == 0 {
            return Ok(outcome);
        }
        let mut updates: Vec<(String, StoredEntry)> = outcome
            .scraped
            .iter()
            .map(|(code, record)| (code.clone(), StoredEntry::Record(record.clone())))
            .collect();
        if let Some(title) = placeholder {
            for code in &outcome.placeholder_applied {
                updates.push((code.clone(), StoredEntry::Record(MetadataRecord::titled(title))));
            }
        }
        self.library.catalog().merge(artist, updates)?;
        info!(
            "{}: {} scraped, {} placeholders, {} still missing",
            artist,
            outcome.scraped.len(),
            outcome.placeholder_applied.len(),
            outcome.still_missing.len()
        );
        Ok(outcome)
    }

    /// Runs `update_artist` for every artist directory. A failing artist is
    /// reported in its own entry and does not stop the run.
    pub fn update_all(
        &self,
        placeholder: Option<&str>,
        scrape_real: bool,
    ) -> Result<BTreeMap<String, ArtistOutcome>, ReconcileError> {
        let mut out = BTreeMap::new();
        for artist in self.library.artists()? {
            let outcome = match self.update_artist(&artist, placeholder, scrape_real) {
                Ok(outcome) => ArtistOutcome::Updated(outcome),
                Err(err) => {
                    warn!("Title update failed for {}: {}", artist, err);
                    ArtistOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            out.insert(artist, outcome);
        }
        Ok(out)
    }

    /// Scrapes `codes` (default: the artist's missing codes), stores every
    /// validated hit and reports `code -> title` for each requested code.
    pub fn scrape_artist(
        &self,
        artist: &str,
        codes: Option<Vec<String>>,
    ) -> Result<BTreeMap<String, Option<String>>, ReconcileError> {
        self.library.require_artist(artist)?;
        let codes = match codes {
            Some(codes) => codes
                .iter()
                .map(|code| normalize_code(code))
                .filter(|code| !code.is_empty())
                .collect(),
            None => self.library.find_missing(artist)?,
        };
        let mut titles: BTreeMap<String, Option<String>> =
            codes.iter().map(|code| (code.clone(), None)).collect();
        if codes.is_empty() {
            return Ok(titles);
        }

        let mut updates = Vec::new();
        for (code, record) in self.scraper.scrape_batch(&codes) {
            match record {
                Some(record) => {
                    titles.insert(code.clone(), Some(record.title.clone()));
                    updates.push((code, StoredEntry::Record(record.resolved())));
                }
                None => {
                    titles.insert(code, None);
                }
            }
        }
        if !updates.is_empty() {
            self.library.catalog().merge(artist, updates)?;
        }
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ReleaseDate;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;

    struct FakeScraper {
        titles: BTreeMap<String, MetadataRecord>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeScraper {
        fn new(titles: &[(&str, MetadataRecord)]) -> Self {
            Self {
                titles: titles
                    .iter()
                    .map(|(code, record)| (code.to_string(), record.clone()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TitleScraper for FakeScraper {
        fn scrape_batch(&self, codes: &[String]) -> Vec<(String, Option<MetadataRecord>)> {
            self.calls.borrow_mut().push(codes.to_vec());
            codes
                .iter()
                .map(|code| (code.clone(), self.titles.get(code).cloned()))
                .collect()
        }
    }

    fn make_code(root: &Path, artist: &str, code: &str) {
        let dir = root.join(artist).join(code);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("clip.mkv"), b"x").unwrap();
    }

    fn foo_library() -> (tempfile::TempDir, Library) {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Foo", "CODE-001");
        make_code(dir.path(), "Foo", "CODE-002");
        fs::write(dir.path().join("Foo/title.json"), r#"{"CODE-002": "Bar"}"#).unwrap();
        let library = Library::new(dir.path().to_path_buf());
        (dir, library)
    }

    #[test]
    fn placeholder_fills_missing_and_upgrades_legacy() {
        let (_dir, library) = foo_library();
        assert_eq!(library.find_missing("Foo").unwrap(), vec!["CODE-001".to_string()]);

        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let outcome = service
            .update_artist("Foo", Some("[Missing]"), false)
            .unwrap();
        assert_eq!(outcome.placeholder_applied, vec!["CODE-001".to_string()]);
        assert!(outcome.scraped.is_empty());
        assert!(service.scraper.calls.borrow().is_empty());

        let catalog = service.library().catalog().load("Foo");
        assert_eq!(catalog["CODE-001"], MetadataRecord::titled("[Missing]"));
        assert_eq!(catalog["CODE-002"], MetadataRecord::titled("Bar"));
        assert!(service.library().find_missing("Foo").unwrap().is_empty());
    }

    #[test]
    fn scraped_titles_win_over_placeholder() {
        let (dir, library) = foo_library();
        make_code(dir.path(), "Foo", "CODE-003");
        let record = MetadataRecord::with_date("Scraped Title Here", Some(ReleaseDate::new(2020, 2, 2)));
        let scraper = FakeScraper::new(&[("CODE-001", record.clone())]);
        let service = ReconciliationService::new(library, scraper);

        let outcome = service.update_artist("Foo", Some("[Missing]"), true).unwrap();
        assert_eq!(outcome.scraped.get("CODE-001"), Some(&record));
        assert_eq!(outcome.placeholder_applied, vec!["CODE-003".to_string()]);

        let catalog = service.library().catalog().load("Foo");
        assert_eq!(catalog["CODE-001"].title, "Scraped Title Here");
        assert_eq!(catalog["CODE-001"].year, Some(2020));
        assert_eq!(catalog["CODE-003"].title, "[Missing]");
    }

    #[test]
    fn without_placeholder_codes_stay_missing() {
        let (_dir, library) = foo_library();
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let outcome = service.update_artist("Foo", None, true).unwrap();
        assert_eq!(outcome.still_missing, vec!["CODE-001".to_string()]);
        assert_eq!(outcome.updated_count(), 0);
        assert_eq!(
            service.library().find_missing("Foo").unwrap(),
            vec!["CODE-001".to_string()]
        );
    }

    #[test]
    fn nothing_missing_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        make_code(dir.path(), "Foo", "A-1");
        fs::write(dir.path().join("Foo/title.json"), r#"{"A-1": "Titled Already"}"#).unwrap();
        let library = Library::new(dir.path().to_path_buf());
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let outcome = service.update_artist("Foo", Some("[Missing]"), true).unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert!(service.scraper.calls.borrow().is_empty());
    }

    #[test]
    fn update_all_reports_each_artist() {
        let (dir, library) = foo_library();
        make_code(dir.path(), "Other", "X-9");
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let results = service.update_all(Some("[Missing]"), false).unwrap();
        assert_eq!(results.len(), 2);
        match &results["Other"] {
            ArtistOutcome::Updated(outcome) => {
                assert_eq!(outcome.placeholder_applied, vec!["X-9".to_string()])
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    /// Stands in for a batch cut short before any code was attempted.
    struct CancelledScraper;

    impl TitleScraper for CancelledScraper {
        fn scrape_batch(&self, _codes: &[String]) -> Vec<(String, Option<MetadataRecord>)> {
            Vec::new()
        }
    }

    #[test]
    fn codes_not_attempted_get_no_placeholder() {
        let (dir, library) = foo_library();
        make_code(dir.path(), "Foo", "CODE-003");
        let service = ReconciliationService::new(library, CancelledScraper);

        let outcome = service.update_artist("Foo", Some("[Missing]"), true).unwrap();
        assert!(outcome.placeholder_applied.is_empty());
        assert_eq!(outcome.updated_count(), 0);
        let mut still_missing = outcome.still_missing.clone();
        still_missing.sort();
        assert_eq!(still_missing, vec!["CODE-001", "CODE-003"]);

        let catalog = service.library().catalog().load("Foo");
        assert!(!catalog.contains_key("CODE-001"));
        assert_eq!(service.library().find_missing("Foo").unwrap().len(), 2);

        let titles = service.scrape_artist("Foo", None).unwrap();
        assert_eq!(titles.len(), 2);
        assert!(titles.values().all(Option::is_none));
    }

    #[test]
    fn padded_artist_name_writes_nothing() {
        let (dir, library) = foo_library();
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        assert!(service
            .update_artist("Foo ", Some("[Missing]"), false)
            .unwrap_err()
            .is_not_found());
        assert!(service.scrape_artist("Foo ", None).unwrap_err().is_not_found());
        assert!(!dir.path().join("Foo ").exists());
        assert_eq!(
            service.library().find_missing("Foo").unwrap(),
            vec!["CODE-001".to_string()]
        );
    }

    #[test]
    fn hand_entered_title_with_bad_year_is_kept() {
        let (_dir, library) = foo_library();
        fs::write(
            library.catalog().catalog_path("Foo"),
            r#"{"Foo": {"CODE-001": {"title": "Hand Entered Title", "year": "2020"}}}"#,
        )
        .unwrap();
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let outcome = service.update_artist("Foo", Some("[Missing]"), false).unwrap();
        assert_eq!(outcome.placeholder_applied, vec!["CODE-002".to_string()]);

        let catalog = service.library().catalog().load("Foo");
        assert_eq!(catalog["CODE-001"].title, "Hand Entered Title");
        assert_eq!(catalog["CODE-002"].title, "[Missing]");
    }

    #[test]
    fn update_unknown_artist_is_not_found() {
        let (_dir, library) = foo_library();
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let err = service.update_artist("Nobody", None, false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn scrape_artist_normalizes_and_persists_hits() {
        let (_dir, library) = foo_library();
        let scraper = FakeScraper::new(&[("CODE-009", MetadataRecord::titled("Found Via Search"))]);
        let service = ReconciliationService::new(library, scraper);

        let titles = service
            .scrape_artist("Foo", Some(vec![" code-009 ".to_string(), "code-010".to_string()]))
            .unwrap();
        assert_eq!(titles["CODE-009"], Some("Found Via Search".to_string()));
        assert_eq!(titles["CODE-010"], None);
        assert_eq!(
            service.library().catalog().load("Foo")["CODE-009"].title,
            "Found Via Search"
        );
    }

    #[test]
    fn scrape_artist_defaults_to_missing_codes() {
        let (_dir, library) = foo_library();
        let service = ReconciliationService::new(library, FakeScraper::new(&[]));
        let titles = service.scrape_artist("Foo", None).unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(
            service.scraper.calls.borrow().as_slice(),
            &[vec!["CODE-001".to_string()]]
        );
    }
}
