//! Persistence of the category mapping.
//!
//! The mapping lives in a JSON document (by default `file_types.json` in the
//! working directory) shaped as an object of category name to extension list:
//!
//! ```json
//! {
//!     "Images": [
//!         ".jpeg",
//!         ".jpg"
//!     ]
//! }
//! ```
//!
//! Key order in the document is the classification order.

use crate::file_category::CategoryMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the category document, relative to the working directory.
pub const DEFAULT_CATEGORIES_FILE: &str = "file_types.json";

/// Errors that can occur while loading or saving the category document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document exists yet at the store path.
    #[error("Category file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// The document could not be read or written.
    #[error("IO error on category file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not a valid category mapping.
    #[error("Invalid category file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The mapping could not be encoded.
    #[error("Failed to encode categories: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reads and writes the [`CategoryMap`] document at a fixed path.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    path: PathBuf,
}

impl CategoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the mapping, writing and returning the built-in defaults if no
    /// document exists yet.
    ///
    /// # Errors
    ///
    /// Fails if an existing document cannot be read or parsed, or if the
    /// defaults cannot be written.
    pub fn load(&self) -> StoreResult<CategoryMap> {
        match self.try_load() {
            Err(StoreError::ConfigNotFound(path)) => {
                log::info!(
                    "No category file at {}, writing defaults",
                    path.display()
                );
                let defaults = CategoryMap::builtin();
                self.save(&defaults)?;
                Ok(defaults)
            }
            other => other,
        }
    }

    /// Loads the mapping without falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the document does not exist.
    pub fn try_load(&self) -> StoreResult<CategoryMap> {
        if !self.path.exists() {
            return Err(StoreError::ConfigNotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrites the document with `map`.
    pub fn save(&self, map: &CategoryMap) -> StoreResult<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        map.serialize(&mut serializer)
            .map_err(StoreError::Serialize)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, buffer).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved {} categories to {}", map.len(), self.path.display());
        Ok(())
    }
}

impl Default for CategoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("file_types.json"));

        let map = store.load().expect("Failed to load categories");
        assert_eq!(map, CategoryMap::builtin());
        assert!(store.path().exists());

        let reloaded = store.try_load().expect("Defaults should have been persisted");
        assert_eq!(reloaded, map);
    }

    #[test]
    fn test_try_load_missing_is_config_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("missing.json"));
        assert!(matches!(store.try_load(), Err(StoreError::ConfigNotFound(_))));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("file_types.json"));

        let mut map = CategoryMap::builtin();
        map.add_extension("Images", ".heic").unwrap();
        map.insert_category("Books", [".epub"]);
        store.save(&map).expect("Failed to save");

        assert_eq!(store.load().expect("Failed to load"), map);
    }

    #[test]
    fn test_saved_document_is_byte_stable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("file_types.json"));
        store.save(&CategoryMap::builtin()).unwrap();
        let first = fs::read_to_string(store.path()).unwrap();

        let map = store.load().unwrap();
        store.save(&map).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("{\n    \"Images\": [\n        \".jpeg\","));
    }

    #[test]
    fn test_invalid_document_is_not_replaced() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("file_types.json");
        fs::write(&path, "{ not json").unwrap();

        let store = CategoryStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("nested/dir/types.json"));
        store.save(&CategoryMap::builtin()).unwrap();
        assert!(store.path().exists());
    }
}
