//! Before/after summaries of a directory's top level.

use crate::config::EntryFilter;
use crate::file_category::extension_of;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Counts of the immediate entries of a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub directory: PathBuf,
    pub total_files: usize,
    pub total_folders: usize,
    /// Files per lowercase extension; files without one are under `""`.
    pub extensions: BTreeMap<String, usize>,
    /// Names of the immediate subdirectories, sorted.
    pub folders: Vec<String>,
}

/// Produces [`Summary`] values. Junk entries are not counted; bundles count
/// as files.
pub struct Summarizer<'a> {
    filter: &'a EntryFilter,
}

impl<'a> Summarizer<'a> {
    pub fn new(filter: &'a EntryFilter) -> Self {
        Self { filter }
    }

    /// Summarizes the top level of `dir`. Subdirectories are not descended.
    pub fn summarize(&self, dir: &Path) -> io::Result<Summary> {
        let mut summary = Summary {
            directory: dir.to_path_buf(),
            ..Default::default()
        };

        for entry in fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if self.filter.is_junk(&name) {
                continue;
            }

            if path.is_file() || (path.is_dir() && self.filter.is_bundle_name(&name)) {
                *summary.extensions.entry(extension_of(&name)).or_insert(0) += 1;
                summary.total_files += 1;
            } else if path.is_dir() {
                summary.total_folders += 1;
                summary.folders.push(name);
            }
        }

        summary.folders.sort();
        Ok(summary)
    }
}
