//! Merging one organized tree into another.
//!
//! For every category folder (and the fallback folder) present in the
//! source, its entries are moved into the same-named folder of the
//! destination. Existing destination entries are never replaced: clashing
//! names get a counter suffix.

use crate::config::EntryFilter;
use crate::file_category::{CategoryMap, FALLBACK_FOLDER};
use crate::file_organizer::{MoveRecord, OrganizeError, move_entry, remove_empty_dirs, unique_name};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a merge before it starts.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("The destination path does not exist: {}", .0.display())]
    DestinationNotFound(PathBuf),
    #[error("The source path is not a directory: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Source and destination are the same tree, or one lies inside the other.
    #[error("Cannot merge {} into {}: the directories overlap", .0.display(), .1.display())]
    OverlappingPaths(PathBuf, PathBuf),
}

/// What happened to one category folder during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderMerge {
    /// Entries were moved into an existing destination folder.
    Merged,
    /// The destination had no such folder; the whole folder was moved.
    Relocated,
}

/// What a merge did.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Category folders touched, in processing order.
    pub folders: Vec<(String, FolderMerge)>,
    /// Entries moved individually into existing destination folders, plus
    /// one record per relocated folder.
    pub moved: Vec<MoveRecord>,
    /// Per-entry failures; the entries stayed in the source.
    pub failures: Vec<OrganizeError>,
    /// Empty source directories removed afterwards.
    pub removed_dirs: Vec<PathBuf>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Moves the category folders of an organized tree into another one.
pub struct Merger<'a> {
    categories: &'a CategoryMap,
    filter: &'a EntryFilter,
}

impl<'a> Merger<'a> {
    pub fn new(categories: &'a CategoryMap, filter: &'a EntryFilter) -> Self {
        Self { categories, filter }
    }

    /// Merges the category folders of `source` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns `DestinationNotFound` if `destination` is not a directory and
    /// `SourceNotFound` if `source` is not one. Merging a tree into itself,
    /// or into a directory inside it (or the reverse), is refused with
    /// `OverlappingPaths`. Failures on individual entries are collected in
    /// the report.
    pub fn run(&self, source: &Path, destination: &Path) -> Result<MergeReport, MergeError> {
        if !destination.is_dir() {
            return Err(MergeError::DestinationNotFound(destination.to_path_buf()));
        }
        if !source.is_dir() {
            return Err(MergeError::SourceNotFound(source.to_path_buf()));
        }
        let source_root = fs::canonicalize(source)
            .map_err(|_| MergeError::SourceNotFound(source.to_path_buf()))?;
        let destination_root = fs::canonicalize(destination)
            .map_err(|_| MergeError::DestinationNotFound(destination.to_path_buf()))?;
        if source_root.starts_with(&destination_root) || destination_root.starts_with(&source_root) {
            return Err(MergeError::OverlappingPaths(
                source.to_path_buf(),
                destination.to_path_buf(),
            ));
        }

        let mut report = MergeReport::default();
        let folders = self.categories.names().chain(std::iter::once(FALLBACK_FOLDER));

        for folder in folders {
            let src_folder = source.join(folder);
            let dest_folder = destination.join(folder);

            if !src_folder.is_dir() {
                continue;
            }

            if dest_folder.is_dir() {
                self.merge_folder(&src_folder, &dest_folder, folder, &mut report);
                report.folders.push((folder.to_string(), FolderMerge::Merged));
            } else {
                match move_entry(&src_folder, &dest_folder) {
                    Ok(()) => {
                        log::info!(
                            "Moved '{}' into '{}'",
                            src_folder.display(),
                            dest_folder.display()
                        );
                        report.moved.push(MoveRecord {
                            original_path: src_folder,
                            new_path: dest_folder,
                            folder: folder.to_string(),
                        });
                        report.folders.push((folder.to_string(), FolderMerge::Relocated));
                    }
                    Err(source) => {
                        let error = OrganizeError::MoveFailed {
                            from: src_folder,
                            to: dest_folder,
                            source,
                        };
                        log::warn!("{}", error);
                        report.failures.push(error);
                    }
                }
            }
        }

        report.removed_dirs = remove_empty_dirs(source);
        log::info!(
            "Merged content from '{}' into '{}'",
            source.display(),
            destination.display()
        );
        Ok(report)
    }

    fn merge_folder(&self, src_folder: &Path, dest_folder: &Path, folder: &str, report: &mut MergeReport) {
        let entries = match fs::read_dir(src_folder) {
            Ok(entries) => entries,
            Err(source) => {
                report.failures.push(OrganizeError::ReadDir {
                    path: src_folder.to_path_buf(),
                    source,
                });
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
                continue;
            };
            if self.filter.is_junk(&name.to_string_lossy()) {
                continue;
            }

            let target = dest_folder.join(unique_name(dest_folder, &name));
            match move_entry(&path, &target) {
                Ok(()) => report.moved.push(MoveRecord {
                    original_path: path,
                    new_path: target,
                    folder: folder.to_string(),
                }),
                Err(source) => {
                    let error = OrganizeError::MoveFailed {
                        from: path,
                        to: target,
                        source,
                    };
                    log::warn!("{}", error);
                    report.failures.push(error);
                }
            }
        }

        log::info!(
            "Moved '{}' into '{}'",
            src_folder.display(),
            dest_folder.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, path.to_string_lossy().as_bytes()).expect("Failed to write test file");
    }

    fn merge(src: &Path, dest: &Path) -> Result<MergeReport, MergeError> {
        let categories = CategoryMap::builtin();
        let filter = EntryFilter::default();
        Merger::new(&categories, &filter).run(src, dest)
    }

    #[test]
    fn test_merge_into_existing_folder() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(src.path().join("Images")).unwrap();
        fs::create_dir(dest.path().join("Images")).unwrap();
        touch(&src.path().join("Images/a.jpg"));
        touch(&dest.path().join("Images/b.jpg"));

        let report = merge(src.path(), dest.path()).unwrap();

        assert!(dest.path().join("Images/a.jpg").exists());
        assert!(dest.path().join("Images/b.jpg").exists());
        assert!(!src.path().join("Images").exists());
        assert_eq!(report.folders, vec![("Images".to_string(), FolderMerge::Merged)]);
    }

    #[test]
    fn test_merge_collision_keeps_both() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(src.path().join("Images")).unwrap();
        fs::create_dir(dest.path().join("Images")).unwrap();
        fs::write(src.path().join("Images/same.jpg"), "from source").unwrap();
        fs::write(dest.path().join("Images/same.jpg"), "from destination").unwrap();

        let report = merge(src.path(), dest.path()).unwrap();

        assert!(report.is_clean());
        assert_eq!(
            fs::read_to_string(dest.path().join("Images/same.jpg")).unwrap(),
            "from destination"
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("Images/same_1.jpg")).unwrap(),
            "from source"
        );
    }

    #[test]
    fn test_merge_relocates_missing_folder() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(src.path().join("ETC")).unwrap();
        touch(&src.path().join("ETC/misc.bin"));

        let report = merge(src.path(), dest.path()).unwrap();

        assert!(dest.path().join("ETC/misc.bin").exists());
        assert!(!src.path().join("ETC").exists());
        assert_eq!(report.folders, vec![("ETC".to_string(), FolderMerge::Relocated)]);
    }

    #[test]
    fn test_merge_ignores_unknown_folders_and_junk() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(src.path().join("Random")).unwrap();
        touch(&src.path().join("Random/keep.txt"));
        fs::create_dir(src.path().join("Audio")).unwrap();
        fs::create_dir(dest.path().join("Audio")).unwrap();
        touch(&src.path().join("Audio/.DS_Store"));
        touch(&src.path().join("Audio/song.mp3"));

        merge(src.path(), dest.path()).unwrap();

        assert!(src.path().join("Random/keep.txt").exists());
        assert!(!dest.path().join("Random").exists());
        assert!(dest.path().join("Audio/song.mp3").exists());
        assert!(!dest.path().join("Audio/.DS_Store").exists());
        assert!(src.path().join("Audio/.DS_Store").exists());
    }

    #[test]
    fn test_merge_into_itself_is_refused() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(dir.path().join("Images")).unwrap();
        touch(&dir.path().join("Images/a.jpg"));

        let result = merge(dir.path(), &dir.path().join("."));

        assert!(matches!(result, Err(MergeError::OverlappingPaths(..))));
        assert!(dir.path().join("Images/a.jpg").exists());
        assert!(!dir.path().join("Images/a_1.jpg").exists());
    }

    #[test]
    fn test_merge_nested_directories_is_refused() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let inner = dir.path().join("ETC/Sorted");
        fs::create_dir_all(&inner).unwrap();
        fs::create_dir(dir.path().join("Images")).unwrap();
        touch(&dir.path().join("Images/a.jpg"));

        assert!(matches!(
            merge(dir.path(), &inner),
            Err(MergeError::OverlappingPaths(..))
        ));
        assert!(matches!(
            merge(&inner, dir.path()),
            Err(MergeError::OverlappingPaths(..))
        ));
        assert!(dir.path().join("Images/a.jpg").exists());
    }

    #[test]
    fn test_merge_missing_destination() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let result = merge(src.path(), Path::new("/non/existent/destination"));
        assert!(matches!(result, Err(MergeError::DestinationNotFound(_))));
    }
}
