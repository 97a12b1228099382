use std::io;
use std::path::Path;

use common::classify_media;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Codes discovered under one artist directory, in filesystem enumeration
/// order. A code qualifies when its folder holds at least one media file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub codes: Vec<String>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

pub fn list_artists(root: &Path) -> io::Result<Vec<String>> {
    child_dirs(root)
}

pub fn scan_artist(artist_dir: &Path) -> io::Result<ScanResult> {
    let mut codes = Vec::new();
    for code in child_dirs(artist_dir)? {
        if has_media(&artist_dir.join(&code)) {
            codes.push(code);
        }
    }
    Ok(ScanResult { codes })
}

fn child_dirs(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory not found: {}", dir.display()),
        ));
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {:?}: {}", dir, err);
                continue;
            }
        };
        if !entry.file_type().is_dir() || is_ignored(&entry) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            out.push(name.to_string());
        } else {
            warn!("Skipping non-utf8 directory {:?}", entry.path());
        }
    }
    Ok(out)
}

fn has_media(code_dir: &Path) -> bool {
    WalkDir::new(code_dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_type().is_file() && classify_media(entry.path()).is_some())
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "__pycache__"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn only_folders_with_media_count_as_codes() {
        let dir = tempfile::tempdir().unwrap();
        let artist = dir.path().join("Foo");
        fs::create_dir_all(artist.join("CODE-001")).unwrap();
        fs::create_dir_all(artist.join("CODE-002")).unwrap();
        fs::create_dir_all(artist.join("__pycache__")).unwrap();
        fs::create_dir_all(artist.join(".hidden")).unwrap();
        fs::write(artist.join("CODE-001/movie.MP4"), b"x").unwrap();
        fs::write(artist.join("CODE-002/poster.jpg"), b"x").unwrap();
        fs::write(artist.join("__pycache__/a.mp4"), b"x").unwrap();
        fs::write(artist.join(".hidden/a.mp4"), b"x").unwrap();
        fs::write(artist.join("title.json"), b"{}").unwrap();

        let result = scan_artist(&artist).unwrap();
        assert_eq!(result.codes, vec!["CODE-001".to_string()]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_artist(&dir.path().join("nobody")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn lists_artist_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Alpha")).unwrap();
        fs::create_dir_all(dir.path().join("Beta")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let mut artists = list_artists(dir.path()).unwrap();
        artists.sort();
        assert_eq!(artists, vec!["Alpha".to_string(), "Beta".to_string()]);
    }
}
