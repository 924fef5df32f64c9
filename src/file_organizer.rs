/// File organization: moving the top-level entries of a directory into
/// category folders.
///
/// The organizer works in two phases. [`Organizer::plan`] lists the
/// immediate entries of the directory and decides where each one goes;
/// [`Organizer::execute`] performs the moves, computing collision-free names
/// at move time. [`Organizer::run`] does both and then removes the empty
/// directories left behind.
///
/// Moves are not atomic with respect to other processes writing into the
/// same folders: [`unique_name`] checks for existence and the move happens
/// afterwards, so a concurrent writer can still take the chosen name.
use crate::config::EntryFilter;
use crate::file_category::{CategoryMap, FALLBACK_FOLDER, split_extension};
use indexmap::IndexMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// How an entry is treated while organizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory moved as a single file because of its suffix (e.g. `.app`).
    Bundle,
    /// A directory that is not a category folder; moved wholesale into the
    /// fallback folder.
    Directory,
}

/// A move decided by [`Organizer::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// The entry to move.
    pub source: PathBuf,
    /// The folder (directly under the organized directory) it moves into.
    pub folder: String,
    pub kind: EntryKind,
}

impl PlannedMove {
    /// File name of the source entry.
    pub fn file_name(&self) -> &OsStr {
        self.source.file_name().unwrap_or_else(|| self.source.as_os_str())
    }
}

/// A move that was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    /// The category folder the entry was moved into.
    pub folder: String,
}

impl MoveRecord {
    /// True if the entry had to be renamed to avoid a collision.
    pub fn was_renamed(&self) -> bool {
        self.original_path.file_name() != self.new_path.file_name()
    }
}

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The directory to organize does not exist or is not a directory.
    #[error("Invalid base path {}", .0.display())]
    InvalidBasePath(PathBuf),
    /// The directory listing could not be read.
    #[error("Error reading directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move an entry; recorded per entry and never fatal to a run.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of a single attempted move, passed to the progress observer.
pub type MoveOutcome<'a> = Result<&'a MoveRecord, &'a OrganizeError>;

/// What an organize run did.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub moved: Vec<MoveRecord>,
    /// Per-entry failures; the entries stayed where they were.
    pub failures: Vec<OrganizeError>,
    /// Empty directories removed during cleanup.
    pub removed_dirs: Vec<PathBuf>,
}

impl OrganizeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of entries moved into each folder, in first-seen order.
    pub fn counts_by_folder(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for record in &self.moved {
            *counts.entry(record.folder.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Returns a name for `file_name` that does not exist in `target_dir`.
///
/// If `target_dir/file_name` is free the name is returned unchanged,
/// otherwise `_1`, `_2`, ... is appended to the stem until a free name is
/// found. Existence is checked again for every candidate.
///
/// # Examples
///
/// ```no_run
/// use sortdir::file_organizer::unique_name;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// // With `photo.jpg` already present in Images/:
/// let name = unique_name(Path::new("Images"), OsStr::new("photo.jpg"));
/// assert_eq!(name, "photo_1.jpg");
/// ```
pub fn unique_name(target_dir: &Path, file_name: &OsStr) -> OsString {
    if !exists(&target_dir.join(file_name)) {
        return file_name.to_os_string();
    }

    // Names that are not valid UTF-8 get the counter appended to the whole name.
    let (stem, ext) = match file_name.to_str() {
        Some(name) => {
            let (stem, ext) = split_extension(name);
            (OsString::from(stem), OsString::from(ext))
        }
        None => (file_name.to_os_string(), OsString::new()),
    };

    let mut counter: u64 = 1;
    loop {
        let mut candidate = stem.clone();
        candidate.push(format!("_{}", counter));
        candidate.push(&ext);
        if !exists(&target_dir.join(&candidate)) {
            return candidate;
        }
        counter += 1;
    }
}

// Dangling symlinks count as taken names.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Moves a file or directory to `destination`.
///
/// Uses a rename; when source and destination are on different filesystems
/// the entry is copied and the source removed.
pub fn move_entry(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "{} is on another filesystem, copying instead",
                destination.display()
            );
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to `destination`, then removes `source`.
///
/// If the copy fails, whatever part of it was written is removed again and
/// `source` is left untouched.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    let preexisting = exists(destination);
    if let Err(e) = copy_recursively(source, destination) {
        if !preexisting {
            discard(destination);
        }
        return Err(e);
    }

    if fs::symlink_metadata(source)?.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    }
}

fn discard(path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(e) = result {
        log::warn!("Could not remove partial copy {}: {}", path.display(), e);
    }
}

fn copy_recursively(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(source)?;
    if !metadata.is_dir() {
        return copy_leaf(source, destination, metadata.file_type());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_leaf(entry.path(), &target, file_type)?;
        }
    }
    Ok(())
}

fn copy_leaf(source: &Path, destination: &Path, file_type: fs::FileType) -> io::Result<()> {
    if file_type.is_symlink() {
        copy_symlink(source, destination)
    } else {
        fs::copy(source, destination).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, destination)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination).map(|_| ())
}

/// Removes every empty directory below `root`, deepest first.
///
/// Directories emptied by the removal of their children are removed too.
/// `root` itself is kept. Failures are logged and skipped.
pub fn remove_empty_dirs(root: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    let walker = WalkDir::new(root).min_depth(1).contents_first(true);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry during cleanup: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }

        match fs::remove_dir(path) {
            Ok(()) => {
                log::info!("Removed empty directory {}", path.display());
                removed.push(path.to_path_buf());
            }
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }

    removed
}

/// Organizes the top-level entries of a directory into category folders.
pub struct Organizer<'a> {
    categories: &'a CategoryMap,
    filter: &'a EntryFilter,
}

impl<'a> Organizer<'a> {
    pub fn new(categories: &'a CategoryMap, filter: &'a EntryFilter) -> Self {
        Self { categories, filter }
    }

    /// Decides where each top-level entry of `base_path` should go, without
    /// touching the filesystem.
    ///
    /// Junk entries, the fallback folder and folders named after a category
    /// are left out. Entries are returned sorted by name.
    ///
    /// # Errors
    ///
    /// Fails if `base_path` is not a directory or cannot be listed.
    pub fn plan(&self, base_path: &Path) -> OrganizeResult<Vec<PlannedMove>> {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidBasePath(base_path.to_path_buf()));
        }

        let entries = fs::read_dir(base_path).map_err(|source| OrganizeError::ReadDir {
            path: base_path.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        let mut planned = Vec::new();
        for path in paths {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            if self.filter.is_junk(&name) {
                log::debug!("Skipping junk entry {}", name);
                continue;
            }

            // `is_file`/`is_dir` follow symlinks; anything else (sockets,
            // dangling links) is left alone.
            let kind = if path.is_file() {
                EntryKind::File
            } else if path.is_dir() && self.filter.is_bundle_name(&name) {
                EntryKind::Bundle
            } else if path.is_dir() {
                if self.categories.is_reserved_folder(&name) {
                    continue;
                }
                EntryKind::Directory
            } else {
                log::debug!("Skipping {}: not a file or directory", path.display());
                continue;
            };

            let folder = match kind {
                EntryKind::Directory => FALLBACK_FOLDER,
                EntryKind::File | EntryKind::Bundle => self.categories.classify(&name).folder_name(),
            };

            planned.push(PlannedMove {
                source: path,
                folder: folder.to_string(),
                kind,
            });
        }

        Ok(planned)
    }

    /// Organizes `base_path` and removes the empty directories left behind.
    ///
    /// # Errors
    ///
    /// Only fails if the run cannot start: the directory cannot be read or the
    /// fallback folder cannot be created. Individual move failures are
    /// collected in the report.
    pub fn run(&self, base_path: &Path) -> OrganizeResult<OrganizeReport> {
        self.run_with(base_path, |_| {})
    }

    /// Like [`Organizer::run`], calling `observer` after every attempted move.
    pub fn run_with<F>(&self, base_path: &Path, observer: F) -> OrganizeResult<OrganizeReport>
    where
        F: FnMut(MoveOutcome<'_>),
    {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidBasePath(base_path.to_path_buf()));
        }
        ensure_dir(&base_path.join(FALLBACK_FOLDER))?;

        let plan = self.plan(base_path)?;
        let mut report = self.execute(base_path, &plan, observer);
        report.removed_dirs = remove_empty_dirs(base_path);
        Ok(report)
    }

    /// Carries out a plan. Every move is attempted; failures are recorded and
    /// the entry stays in place.
    pub fn execute<F>(&self, base_path: &Path, plan: &[PlannedMove], mut observer: F) -> OrganizeReport
    where
        F: FnMut(MoveOutcome<'_>),
    {
        let mut report = OrganizeReport::default();

        for planned in plan {
            match move_into_folder(base_path, planned) {
                Ok(record) => {
                    log::info!(
                        "Moved {} to {}",
                        planned.file_name().to_string_lossy(),
                        record.folder
                    );
                    observer(Ok(&record));
                    report.moved.push(record);
                }
                Err(error) => {
                    log::warn!("{}", error);
                    observer(Err(&error));
                    report.failures.push(error);
                }
            }
        }

        report
    }
}

fn ensure_dir(path: &Path) -> OrganizeResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn move_into_folder(base_path: &Path, planned: &PlannedMove) -> OrganizeResult<MoveRecord> {
    let folder_path = base_path.join(&planned.folder);
    ensure_dir(&folder_path)?;

    let new_name = unique_name(&folder_path, planned.file_name());
    let destination = folder_path.join(new_name);

    move_entry(&planned.source, &destination).map_err(|source| OrganizeError::MoveFailed {
        from: planned.source.clone(),
        to: destination.clone(),
        source,
    })?;

    Ok(MoveRecord {
        original_path: planned.source.clone(),
        new_path: destination,
        folder: planned.folder.clone(),
    })
}
