//! sortdir - sort a directory's files into category folders by extension
//!
//! This library provides the category mapping and its persistence, the
//! extension classifier, the organizer that moves top-level entries into
//! category folders, the merger that combines two organized trees, and the
//! before/after directory summaries used by the CLI.

pub mod category_store;
pub mod cli;
pub mod config;
pub mod editor;
pub mod file_category;
pub mod file_organizer;
pub mod merger;
pub mod output;
pub mod summary;

pub use category_store::{CategoryStore, StoreError};
pub use config::{ConfigError, EntryFilter, Settings};
pub use editor::{CategoryEditor, EditCommand, EditEvent};
pub use file_category::{CategoryError, CategoryMap, Classification, FALLBACK_FOLDER};
pub use file_organizer::{OrganizeError, OrganizeReport, Organizer, unique_name};
pub use merger::{MergeError, MergeReport, Merger};
pub use summary::{Summarizer, Summary};

pub use cli::{Args, run_cli};
