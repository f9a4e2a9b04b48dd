use std::fmt;

use moa_core::{ActionError, CommandId};

/// A navigation request named something the layout does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    UnknownCategory(String),
    UnknownSubCategory { category: String, sub_category: String },
    /// Filter is not declared by the active sub-category (or none is active).
    UnknownFilter { sub_category: Option<String>, filter: String },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory(id) => write!(f, "unknown category: {id}"),
            Self::UnknownSubCategory { category, sub_category } => {
                write!(f, "category '{category}' has no sub-category '{sub_category}'")
            }
            Self::UnknownFilter { sub_category: Some(sub), filter } => {
                write!(f, "sub-category '{sub}' has no filter '{filter}'")
            }
            Self::UnknownFilter { sub_category: None, filter } => {
                write!(f, "no active sub-category for filter '{filter}'")
            }
        }
    }
}

impl std::error::Error for NavError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    UnknownCommand(CommandId),
    /// The command ran (recency was updated, palette closed) but its action failed.
    Action { id: CommandId, error: ActionError },
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(id) => write!(f, "unknown command: {id}"),
            Self::Action { id, error } => write!(f, "command '{id}': {error}"),
        }
    }
}

impl std::error::Error for ExecuteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownCommand(_) => None,
            Self::Action { error, .. } => Some(error),
        }
    }
}
