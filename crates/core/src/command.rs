//! Commands offered by the palette.
//!
//! A command is immutable once registered for a session. Only its id ever
//! leaves the process (in the recency list); the action stays in memory.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::intent::BuiltinAction;

// ============================================================================
// Command IDs
// ============================================================================

/// Stable identifier for a command, unique within a module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CommandId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for CommandId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CommandId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CommandId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Palette grouping bucket. Declaration order is display priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Navigation,
    Actions,
    Data,
    View,
    Settings,
    Help,
}

impl CommandCategory {
    /// Display name for the group header
    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Actions => "Actions",
            Self::Data => "Données",
            Self::View => "Affichage",
            Self::Settings => "Paramètres",
            Self::Help => "Aide",
        }
    }

    /// Default icon reference for commands that don't set one
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Navigation => "compass",
            Self::Actions => "zap",
            Self::Data => "database",
            Self::View => "layout",
            Self::Settings => "settings",
            Self::Help => "help-circle",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [CommandCategory] {
        &[
            Self::Navigation,
            Self::Actions,
            Self::Data,
            Self::View,
            Self::Settings,
            Self::Help,
        ]
    }
}

// ============================================================================
// Actions
// ============================================================================

/// External side effect bound at registration time.
pub type Callback = Rc<dyn Fn() -> Result<(), ActionError>>;

/// What running a command does.
#[derive(Clone)]
pub enum CommandAction {
    /// Handled by the workspace itself.
    Builtin(BuiltinAction),
    /// Handed back to the owning module.
    Callback(Callback),
}

impl fmt::Debug for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(action) => f.debug_tuple("Builtin").field(action).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

// ============================================================================
// Command
// ============================================================================

#[derive(Clone, Debug)]
pub struct Command {
    pub id: CommandId,
    pub label: String,
    pub description: Option<String>,
    pub icon: String,
    pub shortcut: Option<String>,
    pub category: CommandCategory,
    pub keywords: Vec<String>,
    pub action: CommandAction,
}

impl Command {
    pub fn new(
        id: impl Into<CommandId>,
        label: impl Into<String>,
        category: CommandCategory,
        action: CommandAction,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            icon: category.icon().to_string(),
            shortcut: None,
            category,
            keywords: Vec::new(),
            action,
        }
    }

    /// A command that runs a built-in intent.
    pub fn builtin(
        id: impl Into<CommandId>,
        label: impl Into<String>,
        category: CommandCategory,
        action: BuiltinAction,
    ) -> Self {
        Self::new(id, label, category, CommandAction::Builtin(action))
    }

    /// A command bound to an external callback.
    pub fn callback<F>(
        id: impl Into<CommandId>,
        label: impl Into<String>,
        category: CommandCategory,
        f: F,
    ) -> Self
    where
        F: Fn() -> Result<(), ActionError> + 'static,
    {
        Self::new(id, label, category, CommandAction::Callback(Rc::new(f)))
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: set icon reference
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Builder: set shortcut display string
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    /// Builder: set search keywords
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// The built-in intent, if this command runs one.
    pub fn builtin_action(&self) -> Option<&BuiltinAction> {
        match &self.action {
            CommandAction::Builtin(action) => Some(action),
            CommandAction::Callback(_) => None,
        }
    }
}
