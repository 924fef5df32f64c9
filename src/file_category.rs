//! Extension-based file categorization.
//!
//! This module holds the [`CategoryMap`], the ordered mapping from category
//! name to the extensions it recognizes, and the classification rules that
//! decide which category folder an entry belongs to.
//!
//! # Examples
//!
//! ```
//! use sortdir::file_category::{CategoryMap, Classification};
//!
//! let map = CategoryMap::builtin();
//! assert_eq!(map.classify("holiday.JPG"), Classification::Category("Images"));
//! assert_eq!(map.classify("notes"), Classification::Uncategorized);
//! assert_eq!(map.classify("notes").folder_name(), "ETC");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Name of the catch-all folder for entries that match no category.
pub const FALLBACK_FOLDER: &str = "ETC";

/// Errors raised when editing a [`CategoryMap`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    /// The named category is not defined.
    #[error("Category '{0}' does not exist")]
    UnknownCategory(String),
    /// The extension is not listed under the category.
    #[error("{extension} is not in {category}")]
    ExtensionNotFound { category: String, extension: String },
    /// The extension normalizes to nothing.
    #[error("'{0}' is not a valid extension")]
    InvalidExtension(String),
}

/// Result of classifying a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification<'a> {
    /// The first category (in definition order) listing the extension.
    Category(&'a str),
    /// No category lists the extension.
    Uncategorized,
}

impl<'a> Classification<'a> {
    /// Returns the folder name this classification sorts into.
    pub fn folder_name(&self) -> &'a str {
        match self {
            Classification::Category(name) => name,
            Classification::Uncategorized => FALLBACK_FOLDER,
        }
    }
}

/// Outcome of [`CategoryMap::add_extension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Ordered mapping from category name to its recognized extensions.
///
/// Iteration order is definition order, which is also the tie-break order
/// when two categories list the same extension. Extensions are stored
/// normalized: lowercase, with a leading `.`.
#[derive(Debug, Clone, Default, Eq)]
pub struct CategoryMap {
    categories: IndexMap<String, Vec<String>>,
}

// IndexMap equality ignores order; two maps differing only in category order
// classify differently, so they are not equal.
impl PartialEq for CategoryMap {
    fn eq(&self, other: &Self) -> bool {
        self.categories.len() == other.categories.len()
            && self.categories.iter().eq(other.categories.iter())
    }
}

impl CategoryMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built-in categories written on first run.
    pub fn builtin() -> Self {
        let mut map = Self::new();
        map.insert_category(
            "Images",
            [".jpeg", ".jpg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
        );
        map.insert_category("Videos", [".mp4", ".avi", ".mov", ".mkv", ".flv", ".wmv"]);
        map.insert_category(
            "Documents",
            [".pdf", ".docx", ".xlsx", ".pptx", ".odt", ".rtf", ".md"],
        );
        map.insert_category("Archives", [".zip", ".rar", ".tar", ".gz", ".7z"]);
        map.insert_category("Audio", [".mp3", ".wav", ".aac", ".flac", ".ogg"]);
        map.insert_category(
            "Development",
            [".py", ".js", ".h5", ".keras", ".txt", ".csv", ".json", ".pt", ".html"],
        );
        map.insert_category(
            "Executables",
            [".exe", ".msi", ".dmg", ".pkg", ".deb", ".rpm", ".sh", ".bat"],
        );
        map
    }

    /// Defines a category, replacing the extensions of an existing one with
    /// the same name while keeping its position.
    ///
    /// Extensions are normalized and deduplicated; empty ones are dropped.
    pub fn insert_category<I, S>(&mut self, name: &str, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            if let Some(ext) = normalize_extension(ext.as_ref())
                && !normalized.contains(&ext)
            {
                normalized.push(ext);
            }
        }
        self.categories.insert(name.to_string(), normalized);
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// `(name, extensions)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, extensions)| (name.as_str(), extensions.as_slice()))
    }

    /// Extensions of a category, if it exists.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Returns true if `name` is a folder the organizer leaves in place:
    /// a category name or the fallback folder.
    pub fn is_reserved_folder(&self, name: &str) -> bool {
        name == FALLBACK_FOLDER || self.contains_category(name)
    }

    /// Classifies a file name by its extension.
    ///
    /// Categories are scanned in definition order and the first one listing
    /// the extension wins.
    pub fn classify(&self, file_name: &str) -> Classification<'_> {
        let ext = extension_of(file_name);
        if ext.is_empty() {
            return Classification::Uncategorized;
        }

        self.categories
            .iter()
            .find(|(_, extensions)| extensions.contains(&ext))
            .map(|(name, _)| Classification::Category(name.as_str()))
            .unwrap_or(Classification::Uncategorized)
    }

    /// Adds an extension to an existing category.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` if the category is not defined and
    /// `InvalidExtension` if the extension is empty.
    pub fn add_extension(
        &mut self,
        category: &str,
        extension: &str,
    ) -> Result<AddOutcome, CategoryError> {
        let extensions = self
            .categories
            .get_mut(category)
            .ok_or_else(|| CategoryError::UnknownCategory(category.to_string()))?;
        let ext = normalize_extension(extension)
            .ok_or_else(|| CategoryError::InvalidExtension(extension.to_string()))?;

        if extensions.contains(&ext) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        extensions.push(ext);
        Ok(AddOutcome::Added)
    }

    /// Removes an extension from a category.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` if the category is not defined and
    /// `ExtensionNotFound` if it does not list the extension.
    pub fn remove_extension(&mut self, category: &str, extension: &str) -> Result<(), CategoryError> {
        let extensions = self
            .categories
            .get_mut(category)
            .ok_or_else(|| CategoryError::UnknownCategory(category.to_string()))?;
        let not_found = || CategoryError::ExtensionNotFound {
            category: category.to_string(),
            extension: extension.trim().to_lowercase(),
        };
        let ext = normalize_extension(extension).ok_or_else(not_found)?;

        let position = extensions
            .iter()
            .position(|e| *e == ext)
            .ok_or_else(not_found)?;
        extensions.remove(position);
        Ok(())
    }
}

impl Serialize for CategoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.categories.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CategoryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Vec<String>>::deserialize(deserializer)?;
        let mut map = CategoryMap::new();
        for (name, extensions) in raw {
            map.insert_category(&name, extensions);
        }
        Ok(map)
    }
}

/// Normalizes a user-supplied extension to lowercase with a leading `.`.
///
/// Returns `None` for input that is empty after trimming.
///
/// ```
/// use sortdir::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension("MD").as_deref(), Some(".md"));
/// assert_eq!(normalize_extension(" .Jpg ").as_deref(), Some(".jpg"));
/// assert_eq!(normalize_extension("."), None);
/// ```
pub fn normalize_extension(extension: &str) -> Option<String> {
    let trimmed = extension.trim();
    let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if bare.is_empty() {
        return None;
    }
    Some(format!(".{}", bare.to_lowercase()))
}

/// Splits a file name into stem and extension at the last `.`.
///
/// Leading dots never start an extension, so `.bashrc` has no extension.
/// The returned extension keeps its dot and original case.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if !file_name[..idx].trim_start_matches('.').is_empty() => {
            file_name.split_at(idx)
        }
        _ => (file_name, ""),
    }
}

/// Returns the lowercase extension of a file name, including the dot, or an
/// empty string if it has none.
pub fn extension_of(file_name: &str) -> String {
    split_extension(file_name).1.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_category_order() {
        let map = CategoryMap::builtin();
        let names: Vec<_> = map.names().collect();
        assert_eq!(
            names,
            vec![
                "Images",
                "Videos",
                "Documents",
                "Archives",
                "Audio",
                "Development",
                "Executables"
            ]
        );
    }

    #[test]
    fn test_classify_known_extensions() {
        let map = CategoryMap::builtin();
        assert_eq!(map.classify("photo.png"), Classification::Category("Images"));
        assert_eq!(map.classify("report.pdf"), Classification::Category("Documents"));
        assert_eq!(map.classify("script.sh"), Classification::Category("Executables"));
        assert_eq!(map.classify("main.py"), Classification::Category("Development"));
    }

    #[test]
    fn test_classify_case_insensitive() {
        let map = CategoryMap::builtin();
        assert_eq!(map.classify("PHOTO.JPEG"), Classification::Category("Images"));
        assert_eq!(map.classify("Song.Mp3"), Classification::Category("Audio"));
    }

    #[test]
    fn test_classify_uses_last_extension() {
        let map = CategoryMap::builtin();
        assert_eq!(map.classify("backup.tar.gz"), Classification::Category("Archives"));
        assert_eq!(map.classify("photo.png.bak"), Classification::Uncategorized);
    }

    #[test]
    fn test_classify_without_extension() {
        let map = CategoryMap::builtin();
        assert_eq!(map.classify("Makefile"), Classification::Uncategorized);
        assert_eq!(map.classify(".bashrc"), Classification::Uncategorized);
        assert_eq!(map.classify("trailing."), Classification::Uncategorized);
    }

    #[test]
    fn test_classify_first_match_wins() {
        let mut map = CategoryMap::new();
        map.insert_category("Notes", [".txt"]);
        map.insert_category("Development", [".txt", ".rs"]);

        assert_eq!(map.classify("todo.txt"), Classification::Category("Notes"));
        assert_eq!(map.classify("lib.rs"), Classification::Category("Development"));
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(Classification::Category("Images").folder_name(), "Images");
        assert_eq!(Classification::Uncategorized.folder_name(), FALLBACK_FOLDER);
    }

    #[test]
    fn test_insert_category_normalizes_and_dedups() {
        let mut map = CategoryMap::new();
        map.insert_category("Books", ["EPUB", ".epub", " .Mobi", ""]);
        assert_eq!(map.get("Books").unwrap(), &[".epub", ".mobi"]);
    }

    #[test]
    fn test_insert_category_replaces_in_place() {
        let mut map = CategoryMap::builtin();
        map.insert_category("Images", [".raw"]);
        assert_eq!(map.names().next(), Some("Images"));
        assert_eq!(map.get("Images").unwrap(), &[".raw"]);
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn test_add_extension() {
        let mut map = CategoryMap::builtin();
        assert_eq!(map.add_extension("Images", "HEIC"), Ok(AddOutcome::Added));
        assert_eq!(map.classify("pic.heic"), Classification::Category("Images"));
        assert_eq!(map.get("Images").unwrap().last().unwrap(), ".heic");
    }

    #[test]
    fn test_add_extension_already_present() {
        let mut map = CategoryMap::builtin();
        let before = map.clone();
        assert_eq!(map.add_extension("Images", ".JPG"), Ok(AddOutcome::AlreadyPresent));
        assert_eq!(map, before);
    }

    #[test]
    fn test_add_extension_unknown_category() {
        let mut map = CategoryMap::builtin();
        assert_eq!(
            map.add_extension("Fonts", ".ttf"),
            Err(CategoryError::UnknownCategory("Fonts".to_string()))
        );
    }

    #[test]
    fn test_add_extension_rejects_empty() {
        let mut map = CategoryMap::builtin();
        assert!(matches!(
            map.add_extension("Images", " . "),
            Err(CategoryError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_remove_extension() {
        let mut map = CategoryMap::builtin();
        map.remove_extension("Documents", ".MD").unwrap();
        assert_eq!(map.classify("readme.md"), Classification::Uncategorized);
    }

    #[test]
    fn test_remove_extension_errors() {
        let mut map = CategoryMap::builtin();
        assert_eq!(
            map.remove_extension("Nope", ".md"),
            Err(CategoryError::UnknownCategory("Nope".to_string()))
        );
        assert_eq!(
            map.remove_extension("Images", ".pdf"),
            Err(CategoryError::ExtensionNotFound {
                category: "Images".to_string(),
                extension: ".pdf".to_string(),
            })
        );
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.JPG"), ("photo", ".JPG"));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("..hidden"), ("..hidden", ""));
        assert_eq!(split_extension(".hidden.txt"), (".hidden", ".txt"));
        assert_eq!(split_extension("Photos.app"), ("Photos", ".app"));
    }

    #[test]
    fn test_serde_preserves_order() {
        let json = r#"{"Zeta": [".z"], "Alpha": ["A", ".b"]}"#;
        let map: CategoryMap = serde_json::from_str(json).unwrap();
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!(map.get("Alpha").unwrap(), &[".a", ".b"]);

        let written = serde_json::to_string(&map).unwrap();
        assert_eq!(written, r#"{"Zeta":[".z"],"Alpha":[".a",".b"]}"#);
    }

    #[test]
    fn test_equality_respects_category_order() {
        let mut first = CategoryMap::new();
        first.insert_category("Notes", [".txt"]);
        first.insert_category("Code", [".txt"]);
        let mut second = CategoryMap::new();
        second.insert_category("Code", [".txt"]);
        second.insert_category("Notes", [".txt"]);

        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }
}
