//! Category editing as a state machine.
//!
//! The editor owns a working copy of the [`CategoryMap`] and applies one
//! [`EditCommand`] at a time, reporting the result as an [`EditEvent`]. It
//! does no I/O; the CLI reads commands from the terminal and persists the map
//! once the editor reports [`EditEvent::Finished`].

use crate::file_category::{AddOutcome, CategoryError, CategoryMap, normalize_extension};

/// Entries of the interactive edit menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    View,
    Add,
    Remove,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 4] = [
        MenuChoice::View,
        MenuChoice::Add,
        MenuChoice::Remove,
        MenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::View => "View current file types",
            MenuChoice::Add => "Add extension to a category",
            MenuChoice::Remove => "Remove extension from a category",
            MenuChoice::Exit => "Exit modification",
        }
    }

    /// True if the choice needs a category and an extension from the user.
    pub fn needs_arguments(&self) -> bool {
        matches!(self, MenuChoice::Add | MenuChoice::Remove)
    }

    /// Builds the command for this choice. `category` and `extension` are
    /// ignored for choices that take no arguments.
    pub fn into_command(self, category: &str, extension: &str) -> EditCommand {
        match self {
            MenuChoice::View => EditCommand::View,
            MenuChoice::Add => EditCommand::AddExtension {
                category: category.trim().to_string(),
                extension: extension.to_string(),
            },
            MenuChoice::Remove => EditCommand::RemoveExtension {
                category: category.trim().to_string(),
                extension: extension.to_string(),
            },
            MenuChoice::Exit => EditCommand::SaveAndExit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    View,
    AddExtension { category: String, extension: String },
    RemoveExtension { category: String, extension: String },
    SaveAndExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// The current categories, in order.
    Listed(Vec<(String, Vec<String>)>),
    Added { category: String, extension: String },
    AlreadyPresent { category: String, extension: String },
    Removed { category: String, extension: String },
    /// The command was refused; the map is unchanged.
    Rejected(CategoryError),
    /// Editing is over and the map should be saved.
    Finished,
}

#[derive(Debug, Clone)]
pub struct CategoryEditor {
    map: CategoryMap,
    finished: bool,
}

impl CategoryEditor {
    pub fn new(map: CategoryMap) -> Self {
        Self {
            map,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_map(self) -> CategoryMap {
        self.map
    }

    /// Applies one command. Commands after `SaveAndExit` are ignored and
    /// answer `Finished` again.
    pub fn apply(&mut self, command: EditCommand) -> EditEvent {
        if self.finished {
            return EditEvent::Finished;
        }

        match command {
            EditCommand::View => EditEvent::Listed(
                self.map
                    .iter()
                    .map(|(name, exts)| (name.to_string(), exts.to_vec()))
                    .collect(),
            ),
            EditCommand::AddExtension {
                category,
                extension,
            } => match self.map.add_extension(&category, &extension) {
                Ok(outcome) => {
                    let extension = normalize_extension(&extension).unwrap_or(extension);
                    match outcome {
                        AddOutcome::Added => EditEvent::Added {
                            category,
                            extension,
                        },
                        AddOutcome::AlreadyPresent => EditEvent::AlreadyPresent {
                            category,
                            extension,
                        },
                    }
                }
                Err(e) => EditEvent::Rejected(e),
            },
            EditCommand::RemoveExtension {
                category,
                extension,
            } => match self.map.remove_extension(&category, &extension) {
                Ok(()) => EditEvent::Removed {
                    extension: normalize_extension(&extension).unwrap_or(extension),
                    category,
                },
                Err(e) => EditEvent::Rejected(e),
            },
            EditCommand::SaveAndExit => {
                self.finished = true;
                EditEvent::Finished
            }
        }
    }
}
