//! Settings file and entry filtering rules.
//!
//! Settings are read from an optional TOML file and control which entries
//! are treated as junk (never moved, never counted) and which directories
//! are treated as single-file bundles:
//!
//! ```toml
//! categories_file = "file_types.json"
//!
//! [junk]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.crdownload"]
//! regex = ['^~\$']
//!
//! [bundles]
//! suffixes = [".app"]
//! ```
//!
//! `.DS_Store` is junk whatever the file says.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Platform metadata file that is always ignored.
pub const DS_STORE: &str = ".DS_Store";

/// Settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = ".sortdir.toml";

/// Errors that can occur while loading settings or compiling filters.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Settings file not found at an explicitly given path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading the settings file.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Location of the category document, relative to the working directory.
    #[serde(default)]
    pub categories_file: Option<PathBuf>,

    #[serde(default)]
    pub junk: JunkRules,

    #[serde(default)]
    pub bundles: BundleRules,
}

/// Entries ignored by every scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JunkRules {
    /// Exact file names (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Directories that are moved like files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleRules {
    /// Name suffixes marking a directory as a bundle.
    #[serde(default = "default_bundle_suffixes")]
    pub suffixes: Vec<String>,
}

fn default_bundle_suffixes() -> Vec<String> {
    vec![".app".to_string()]
}

impl Default for BundleRules {
    fn default() -> Self {
        Self {
            suffixes: default_bundle_suffixes(),
        }
    }
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.sortdir.toml` in the current directory
    /// 3. `~/.config/sortdir/config.toml`
    /// 4. defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found (or explicitly given) but cannot
    /// be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        log::debug!("Loaded settings from {}", path.display());

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the junk and bundle rules into an [`EntryFilter`].
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<EntryFilter, ConfigError> {
        EntryFilter::new(&self.junk, &self.bundles)
    }
}

/// Compiled junk and bundle rules shared by the organizer, merger and
/// summarizer.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    junk_filenames: HashSet<String>,
    junk_patterns: Vec<Pattern>,
    junk_regexes: Vec<Regex>,
    bundle_suffixes: Vec<String>,
}

impl EntryFilter {
    fn new(junk: &JunkRules, bundles: &BundleRules) -> Result<Self, ConfigError> {
        let junk_patterns = junk
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let junk_regexes = junk
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut junk_filenames: HashSet<String> = junk.filenames.iter().cloned().collect();
        junk_filenames.insert(DS_STORE.to_string());

        Ok(Self {
            junk_filenames,
            junk_patterns,
            junk_regexes,
            bundle_suffixes: bundles
                .suffixes
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// Returns true if the entry named `file_name` must be left alone.
    pub fn is_junk(&self, file_name: &str) -> bool {
        self.junk_filenames.contains(file_name)
            || self.junk_patterns.iter().any(|p| p.matches(file_name))
            || self.junk_regexes.iter().any(|r| r.is_match(file_name))
    }

    /// Returns true if a directory named `file_name` is moved as a single file.
    pub fn is_bundle_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.bundle_suffixes.iter().any(|s| lower.ends_with(s.as_str()))
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            junk_filenames: HashSet::from([DS_STORE.to_string()]),
            junk_patterns: Vec::new(),
            junk_regexes: Vec::new(),
            bundle_suffixes: default_bundle_suffixes(),
        }
    }
}
