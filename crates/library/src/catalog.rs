use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{MetadataRecord, ReleaseDate, StoredEntry, TitleCatalog};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::CatalogError;

pub const DEFAULT_CATALOG_FILE: &str = "title.json";

/// Persisted `<root>/<artist>/title.json` catalogs.
///
/// The file holds `{ "<Artist>": { "<CODE>": <entry> } }`, or a flat
/// `{ "<CODE>": <entry> }` in older installs. Entries are either bare title
/// strings (legacy) or full records; both are upgraded to records on load.
/// Writes are serialized per artist and land through a temp file + rename.
#[derive(Clone)]
pub struct TitleCatalogStore {
    root: PathBuf,
    file_name: String,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TitleCatalogStore {
    pub fn new(root: PathBuf, file_name: &str) -> Self {
        let file_name = if file_name.trim().is_empty() {
            DEFAULT_CATALOG_FILE.to_string()
        } else {
            file_name.trim().to_string()
        };
        Self {
            root,
            file_name,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn catalog_path(&self, artist: &str) -> PathBuf {
        self.root.join(artist).join(&self.file_name)
    }

    /// Never fails: a missing or malformed file reads as an empty catalog.
    pub fn load(&self, artist: &str) -> TitleCatalog {
        let path = self.catalog_path(artist);
        upgrade_entries(&path, self.read_section(artist))
    }

    /// Every code with an entry, including entries that cannot be read as a
    /// record. A present key counts as titled.
    pub fn codes(&self, artist: &str) -> BTreeSet<String> {
        self.read_section(artist).into_iter().map(|(code, _)| code).collect()
    }

    /// Overwrites each touched code with its new value and rewrites the
    /// whole file. Other artists' sections in the same file are preserved,
    /// as are entries of this artist that cannot be read as a record.
    pub fn merge<I, E>(&self, artist: &str, updates: I) -> Result<usize, CatalogError>
    where
        I: IntoIterator<Item = (String, E)>,
        E: Into<StoredEntry>,
    {
        let lock = self.artist_lock(artist);
        let _guard = lock.lock();

        let path = self.catalog_path(artist);
        let mut container = container_for_write(&path)?;
        let mut section = Map::new();
        for (code, value) in take_artist_entries(artist, &mut container) {
            match read_entry(&value) {
                Some(record) => {
                    section.insert(code, serde_json::to_value(&record)?);
                }
                None => {
                    warn!("Keeping unreadable entry {} in {:?} as-is", code, path);
                    section.insert(code, value);
                }
            }
        }
        let mut touched = 0usize;
        for (code, entry) in updates {
            section.insert(code, serde_json::to_value(entry.into().into_record())?);
            touched += 1;
        }
        container.insert(artist.to_string(), Value::Object(section));
        write_atomic(&path, &Value::Object(container))?;
        debug!("Merged {} entries into {:?}", touched, path);
        Ok(touched)
    }

    /// Replaces the artist's readable entries with `catalog`. Entries that
    /// cannot be read as a record are kept unless `catalog` has that code.
    pub fn rewrite(&self, artist: &str, catalog: &TitleCatalog) -> Result<(), CatalogError> {
        let lock = self.artist_lock(artist);
        let _guard = lock.lock();

        let path = self.catalog_path(artist);
        let mut container = container_for_write(&path)?;
        let mut section: Map<String, Value> = take_artist_entries(artist, &mut container)
            .into_iter()
            .filter(|(code, value)| !catalog.contains_key(code) && read_entry(value).is_none())
            .collect();
        for (code, record) in catalog {
            section.insert(code.clone(), serde_json::to_value(record.clone().resolved())?);
        }
        container.insert(artist.to_string(), Value::Object(section));
        write_atomic(&path, &Value::Object(container))?;
        Ok(())
    }

    fn read_section(&self, artist: &str) -> Map<String, Value> {
        let path = self.catalog_path(artist);
        match read_container(&path) {
            Ok(Some(mut container)) => take_artist_entries(artist, &mut container),
            Ok(None) => Map::new(),
            Err(err) => {
                warn!("Treating catalog {:?} as empty: {}", path, err);
                Map::new()
            }
        }
    }

    fn artist_lock(&self, artist: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(artist.to_string()).or_default())
    }
}

#[derive(Debug)]
enum ReadError {
    Io(io::Error),
    Json(serde_json::Error),
    NotAnObject,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Io(err) => write!(f, "io error: {}", err),
            ReadError::Json(err) => write!(f, "json error: {}", err),
            ReadError::NotAnObject => write!(f, "top level is not an object"),
        }
    }
}

fn read_container(path: &Path) -> Result<Option<Map<String, Value>>, ReadError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ReadError::Io(err)),
    };
    match serde_json::from_str::<Value>(&contents).map_err(ReadError::Json)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ReadError::NotAnObject),
    }
}

/// Current container for a write. Read failures other than a missing file
/// abort the write; a malformed file is replaced.
fn container_for_write(path: &Path) -> Result<Map<String, Value>, CatalogError> {
    match read_container(path) {
        Ok(Some(container)) => Ok(container),
        Ok(None) => Ok(Map::new()),
        Err(ReadError::Io(err)) => Err(CatalogError::Io(err)),
        Err(err) => {
            warn!("Replacing malformed catalog {:?}: {}", path, err);
            Ok(Map::new())
        }
    }
}

/// Removes and returns this artist's entries from the container: the nested
/// section when present, otherwise the flat code entries at top level.
fn take_artist_entries(artist: &str, container: &mut Map<String, Value>) -> Map<String, Value> {
    match container.remove(artist) {
        Some(Value::Object(section)) => return section,
        Some(other) => {
            warn!("Ignoring non-object catalog section for {}: {}", artist, other);
            return Map::new();
        }
        None => {}
    }
    let flat_keys: Vec<String> = container
        .iter()
        .filter(|(_, value)| is_flat_entry(value))
        .map(|(key, _)| key.clone())
        .collect();
    let mut section = Map::new();
    for key in flat_keys {
        if let Some(value) = container.remove(&key) {
            section.insert(key, value);
        }
    }
    section
}

fn is_flat_entry(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => map.get("title").map(Value::is_string).unwrap_or(false),
        _ => false,
    }
}

fn upgrade_entries(path: &Path, section: Map<String, Value>) -> TitleCatalog {
    let mut catalog = TitleCatalog::new();
    for (code, value) in section {
        match read_entry(&value) {
            Some(record) => {
                catalog.insert(code, record);
            }
            None => warn!("Unreadable entry {} in {:?}: {}", code, path, value),
        }
    }
    catalog
}

/// Reads a stored entry. Records with malformed date fields still yield
/// their title; only values with no string title are unreadable.
fn read_entry(value: &Value) -> Option<MetadataRecord> {
    if let Ok(entry) = serde_json::from_value::<StoredEntry>(value.clone()) {
        return Some(entry.into_record());
    }
    let map = value.as_object()?;
    let mut record = MetadataRecord::titled(map.get("title")?.as_str()?);
    record.year = int_field(map, "year").and_then(|v| i32::try_from(v).ok());
    record.month = int_field(map, "month").and_then(|v| u32::try_from(v).ok());
    record.day = int_field(map, "day").and_then(|v| u32::try_from(v).ok());
    record.date = map
        .get("date")
        .and_then(|date| serde_json::from_value::<ReleaseDate>(date.clone()).ok());
    Some(record.resolved())
}

fn int_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn write_atomic(path: &Path, value: &Value) -> Result<(), CatalogError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    value.serialize(&mut serializer)?;
    body.push(b'\n');

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "catalog".to_string());
    let tmp_path = parent.join(format!(".{}.tmp", file_name));
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CatalogError::Io(err));
    }
    Ok(())
}
