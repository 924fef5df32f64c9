//! Command-line interface module for sortdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Loading settings and categories
//! - The confirmation gate and the category edit menu
//! - Organization and merge orchestration

use crate::category_store::{CategoryStore, DEFAULT_CATEGORIES_FILE, StoreError};
use crate::config::{ConfigError, EntryFilter, Settings};
use crate::editor::{CategoryEditor, EditEvent, MenuChoice};
use crate::file_category::{CategoryMap, FALLBACK_FOLDER};
use crate::file_organizer::{OrganizeError, Organizer};
use crate::merger::Merger;
use crate::output::OutputFormatter;
use crate::summary::Summarizer;
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort the files of a directory into category folders by extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Args {
    /// Path to the directory to organize
    #[arg(long, value_name = "PATH")]
    pub dir: PathBuf,

    /// Path of an organized directory to merge the categories of --dir into
    #[arg(long, value_name = "PATH")]
    pub merge: Option<PathBuf>,

    /// Proceed without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Show where entries would go without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Category file (default: file_types.json in the working directory)
    #[arg(long, value_name = "FILE")]
    pub categories: Option<PathBuf>,

    /// Settings file (default: .sortdir.toml, then ~/.config/sortdir/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("The path '{}' is not a valid directory", .0.display())]
    InvalidTarget(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error("Could not read {}: {source}", path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input error: {0}")]
    Prompt(String),
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Prompt(err.to_string())
    }
}

/// Terminal interaction used by the CLI, replaceable in tests.
pub trait Prompter {
    /// Asks a yes/no question.
    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError>;
    /// Asks the user to pick one of `items`; returns its index.
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize, CliError>;
    /// Asks for a line of text.
    fn input(&mut self, prompt: &str) -> Result<String, CliError>;
}

/// [`Prompter`] backed by dialoguer.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize, CliError> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }

    fn input(&mut self, prompt: &str) -> Result<String, CliError> {
        Ok(Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()?)
    }
}

/// What a CLI run ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The directory was organized (and merged, if requested).
    Organized,
    /// Dry run only; nothing was touched.
    DryRun,
    /// The user declined and went through the category editor.
    Edited,
}

/// Runs the CLI with the terminal prompter.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sortdir::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["sortdir", "--dir", "/path/to/Downloads", "--yes"]);
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunOutcome, CliError> {
    run_cli_with(args, &mut TerminalPrompter::new())
}

/// Runs the CLI with the given prompter.
///
/// Flow: validate the target, load settings and categories, print the
/// summary, confirm, organize, optionally merge, print the final summary.
/// Declining the confirmation opens the category editor instead.
pub fn run_cli_with(args: &Args, prompter: &mut dyn Prompter) -> Result<RunOutcome, CliError> {
    // Checked before anything else so an invalid target never leads to writes.
    if !args.dir.is_dir() {
        return Err(CliError::InvalidTarget(args.dir.clone()));
    }

    let settings = Settings::load(args.config.as_deref())?;
    let filter = settings.compile()?;
    let store = CategoryStore::new(categories_path(args, &settings));
    let categories = if args.dry_run {
        match store.try_load() {
            Err(StoreError::ConfigNotFound(_)) => CategoryMap::builtin(),
            loaded => loaded?,
        }
    } else {
        store.load()?
    };

    print_summary(&filter, &args.dir)?;
    OutputFormatter::categories(categories.iter());
    OutputFormatter::plain(&format!(
        "Non-categorized files and folders will move to {}.",
        FALLBACK_FOLDER
    ));

    if args.dry_run {
        let plan = Organizer::new(&categories, &filter).plan(&args.dir)?;
        OutputFormatter::plan(&plan);
        return Ok(RunOutcome::DryRun);
    }

    let proceed = args.yes || prompter.confirm("Do you want to proceed with these settings?")?;
    if !proceed {
        OutputFormatter::info("You can modify the file type settings.");
        edit_categories(&store, categories, prompter)?;
        return Ok(RunOutcome::Edited);
    }

    organize(&categories, &filter, &args.dir)?;

    if let Some(destination) = &args.merge {
        match Merger::new(&categories, &filter).run(&args.dir, destination) {
            Ok(report) => {
                OutputFormatter::merge_report(&report);
                OutputFormatter::success(&format!(
                    "Merged content from '{}' into '{}'.",
                    args.dir.display(),
                    destination.display()
                ));
            }
            // Fatal to the merge step only; the final summary still runs.
            Err(e) => OutputFormatter::error(&format!("{}. Cannot merge.", e)),
        }
    }

    print_summary(&filter, &args.dir)?;
    Ok(RunOutcome::Organized)
}

fn categories_path(args: &Args, settings: &Settings) -> PathBuf {
    args.categories
        .clone()
        .or_else(|| settings.categories_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATEGORIES_FILE))
}

fn print_summary(filter: &EntryFilter, dir: &Path) -> Result<(), CliError> {
    let summary = Summarizer::new(filter)
        .summarize(dir)
        .map_err(|source| CliError::Summary {
            path: dir.to_path_buf(),
            source,
        })?;
    OutputFormatter::summary(&summary);
    Ok(())
}

fn organize(categories: &CategoryMap, filter: &EntryFilter, dir: &Path) -> Result<(), CliError> {
    let organizer = Organizer::new(categories, filter);
    let total = organizer.plan(dir)?.len();
    let pb = OutputFormatter::create_progress_bar(total as u64);

    let report = organizer.run_with(dir, |outcome| {
        if let Ok(record) = outcome {
            pb.set_message(record.folder.clone());
        }
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    OutputFormatter::organize_report(&report);
    if report.is_clean() {
        OutputFormatter::success("Organized directory.");
    } else {
        OutputFormatter::warning("Some entries could not be organized. Please review errors above.");
    }
    Ok(())
}

/// Drives the category editor from the prompter and saves the result.
pub fn edit_categories(
    store: &CategoryStore,
    categories: CategoryMap,
    prompter: &mut dyn Prompter,
) -> Result<CategoryMap, CliError> {
    let mut editor = CategoryEditor::new(categories);
    let labels: Vec<&str> = MenuChoice::ALL.iter().map(|c| c.label()).collect();

    while !editor.is_finished() {
        let choice = MenuChoice::ALL[prompter.select("Modify file types", &labels)?];

        let (category, extension) = if choice.needs_arguments() {
            let verb = if choice == MenuChoice::Add { "add" } else { "remove" };
            let category = prompter.input(&format!("Enter the category to {} an extension", verb))?;
            let extension = prompter.input(&format!("Enter the extension to {} (e.g., .md)", verb))?;
            (category, extension)
        } else {
            (String::new(), String::new())
        };

        match editor.apply(choice.into_command(&category, &extension)) {
            EditEvent::Listed(listing) => OutputFormatter::categories(
                listing
                    .iter()
                    .map(|(name, extensions)| (name.as_str(), extensions.as_slice())),
            ),
            EditEvent::Added { category, extension } => {
                OutputFormatter::success(&format!("Added {} to {}.", extension, category))
            }
            EditEvent::AlreadyPresent { category, extension } => {
                OutputFormatter::warning(&format!("{} is already in {}.", extension, category))
            }
            EditEvent::Removed { category, extension } => {
                OutputFormatter::success(&format!("Removed {} from {}.", extension, category))
            }
            EditEvent::Rejected(e) => OutputFormatter::error(&e.to_string()),
            EditEvent::Finished => {}
        }
    }

    let map = editor.into_map();
    store.save(&map)?;
    OutputFormatter::success(&format!("Saved file types to {}", store.path().display()));
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Prompter replaying canned answers.
    #[derive(Default)]
    struct Scripted {
        confirms: VecDeque<bool>,
        selections: VecDeque<usize>,
        inputs: VecDeque<String>,
    }

    impl Prompter for Scripted {
        fn confirm(&mut self, _prompt: &str) -> Result<bool, CliError> {
            self.confirms
                .pop_front()
                .ok_or_else(|| CliError::Prompt("no confirmation scripted".to_string()))
        }

        fn select(&mut self, _prompt: &str, _items: &[&str]) -> Result<usize, CliError> {
            self.selections
                .pop_front()
                .ok_or_else(|| CliError::Prompt("no selection scripted".to_string()))
        }

        fn input(&mut self, _prompt: &str) -> Result<String, CliError> {
            self.inputs
                .pop_front()
                .ok_or_else(|| CliError::Prompt("no input scripted".to_string()))
        }
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["sortdir", "--dir", "/tmp/a", "--merge", "/tmp/b", "-y"]);
        assert_eq!(args.dir, PathBuf::from("/tmp/a"));
        assert_eq!(args.merge, Some(PathBuf::from("/tmp/b")));
        assert!(args.yes);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_args_require_dir() {
        assert!(Args::try_parse_from(["sortdir"]).is_err());
    }

    #[test]
    fn test_categories_path_precedence() {
        let mut args = Args::parse_from(["sortdir", "--dir", "."]);
        let mut settings = Settings::default();
        assert_eq!(categories_path(&args, &settings), PathBuf::from(DEFAULT_CATEGORIES_FILE));

        settings.categories_file = Some(PathBuf::from("from_settings.json"));
        assert_eq!(categories_path(&args, &settings), PathBuf::from("from_settings.json"));

        args.categories = Some(PathBuf::from("from_args.json"));
        assert_eq!(categories_path(&args, &settings), PathBuf::from("from_args.json"));
    }

    #[test]
    fn test_edit_categories_saves_on_exit() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CategoryStore::new(temp_dir.path().join("file_types.json"));
        let mut prompter = Scripted {
            selections: VecDeque::from([0, 1, 2, 1, 3]),
            inputs: VecDeque::from(
                ["Images", "HEIC", "Documents", ".md", "Nope", ".x"].map(String::from),
            ),
            ..Default::default()
        };

        let map = edit_categories(&store, CategoryMap::builtin(), &mut prompter).unwrap();

        assert!(map.get("Images").unwrap().contains(&".heic".to_string()));
        assert!(!map.get("Documents").unwrap().contains(&".md".to_string()));
        assert!(!map.contains_category("Nope"));
        assert_eq!(store.try_load().unwrap(), map);
    }
}
