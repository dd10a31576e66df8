//! Favorites store - the ordered list of repositories the user tracks
//!
//! The list is persisted as a JSON array of `{"url", "path"}` objects. Insertion
//! order is display order and is preserved across save/load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::error::RepoResult;
use crate::persist::{read_json_or_default, write_json_atomic};

/// A favorite repository and the local path it was cloned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub url: String,
    pub path: PathBuf,
}

impl FavoriteEntry {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }
}

/// Durable, ordered list of favorites backed by a single JSON file
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    // serializes load-modify-save so concurrent add/remove don't lose writes
    write_lock: Mutex<()>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all favorites; an absent file is an empty list
    pub fn load(&self) -> RepoResult<Vec<FavoriteEntry>> {
        read_json_or_default(&self.path)
    }

    /// Replace the stored list
    pub fn save(&self, entries: &[FavoriteEntry]) -> RepoResult<()> {
        write_json_atomic(&self.path, entries)
    }

    /// Append an entry and persist; returns the updated list
    pub fn add(&self, entry: FavoriteEntry) -> RepoResult<Vec<FavoriteEntry>> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.load()?;
        info!("Adding favorite: {} -> {}", entry.url, entry.path.display());
        entries.push(entry);
        self.save(&entries)?;

        Ok(entries)
    }

    /// Remove every entry whose url equals `url`; returns how many were dropped
    pub fn remove(&self, url: &str) -> RepoResult<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|entry| entry.url != url);
        let removed = before - entries.len();

        self.save(&entries)?;
        info!("Removed {} favorite(s) for {}", removed, url);

        Ok(removed)
    }

    /// First favorite with the given url
    pub fn find(&self, url: &str) -> RepoResult<Option<FavoriteEntry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.url == url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FavoritesStore {
        FavoritesStore::new(dir.path().join("repos_favoritos.json"))
    }

    #[test]
    fn test_load_without_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.add(FavoriteEntry::new("https://example.com/b.git", "/src/b")).unwrap();
        store.add(FavoriteEntry::new("https://example.com/a.git", "/src/a")).unwrap();
        store.add(FavoriteEntry::new("https://example.com/c.git", "/src/c")).unwrap();

        let urls: Vec<_> = store.load().unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/b.git",
                "https://example.com/a.git",
                "https://example.com/c.git"
            ]
        );
    }

    #[test]
    fn test_remove_drops_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.add(FavoriteEntry::new("dup", "/one")).unwrap();
        store.add(FavoriteEntry::new("keep", "/keep")).unwrap();
        store.add(FavoriteEntry::new("dup", "/two")).unwrap();

        assert_eq!(store.remove("dup").unwrap(), 2);
        assert_eq!(store.load().unwrap(), vec![FavoriteEntry::new("keep", "/keep")]);
    }

    #[test]
    fn test_remove_unknown_url_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.add(FavoriteEntry::new("a", "/a")).unwrap();

        assert_eq!(store.remove("missing").unwrap(), 0);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_find_returns_first_match() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.add(FavoriteEntry::new("a", "/first")).unwrap();
        store.add(FavoriteEntry::new("a", "/second")).unwrap();

        let found = store.find("a").unwrap().unwrap();
        assert_eq!(found.path, PathBuf::from("/first"));
        assert!(store.find("b").unwrap().is_none());
    }

    #[test]
    fn test_file_format_is_array_of_url_path_objects() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.add(FavoriteEntry::new("https://example.com/r.git", "/src/r")).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "url": "https://example.com/r.git", "path": "/src/r" }])
        );
    }

    #[test]
    fn test_reads_file_written_by_other_tools() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        std::fs::write(
            store.path(),
            r#"[{"url": "git@example.com:x/y.git", "path": "C:\\repos\\main"}]"#,
        )
        .unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "git@example.com:x/y.git");
    }

    #[test]
    fn test_malformed_store_propagates_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        std::fs::write(store.path(), r#"{"url": "not-an-array"}"#).unwrap();

        assert_matches!(store.load(), Err(RepoError::PersistenceError { .. }));
        assert_matches!(
            store.add(FavoriteEntry::new("a", "/a")),
            Err(RepoError::PersistenceError { .. })
        );
    }
}
