use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "m4a"];

/// Per-artist mapping of work code to its metadata record.
pub type TitleCatalog = BTreeMap<String, MetadataRecord>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePattern {
    pub series: String,
    pub number: String,
    pub suffix: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl ReleaseDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
        }
    }
}

/// Value stored per (artist, code). The top-level `year`/`month`/`day`
/// mirror `date` so readers that only need the year never unpack it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub date: Option<ReleaseDate>,
}

impl MetadataRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_date(title: impl Into<String>, date: Option<ReleaseDate>) -> Self {
        let mut record = Self {
            title: title.into(),
            date,
            ..Self::default()
        };
        record.resolve_dates();
        record
    }

    /// Fills missing top-level date fields from `date`. Existing top-level
    /// values win.
    pub fn resolve_dates(&mut self) {
        if let Some(date) = self.date {
            self.year = self.year.or(date.year);
            self.month = self.month.or(date.month);
            self.day = self.day.or(date.day);
        }
    }

    pub fn resolved(mut self) -> Self {
        self.resolve_dates();
        self
    }
}

/// A catalog entry as it may appear on disk: either a bare title string
/// (legacy) or a full record. Only the catalog store sees this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Legacy(String),
    Record(MetadataRecord),
}

impl StoredEntry {
    pub fn into_record(self) -> MetadataRecord {
        match self {
            StoredEntry::Legacy(title) => MetadataRecord::titled(title),
            StoredEntry::Record(record) => record.resolved(),
        }
    }
}

impl From<String> for StoredEntry {
    fn from(title: String) -> Self {
        StoredEntry::Legacy(title)
    }
}

impl From<&str> for StoredEntry {
    fn from(title: &str) -> Self {
        StoredEntry::Legacy(title.to_string())
    }
}

impl From<MetadataRecord> for StoredEntry {
    fn from(record: MetadataRecord) -> Self {
        StoredEntry::Record(record)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

pub fn classify_media(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}
