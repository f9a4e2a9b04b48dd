//! `moa-core`: value types shared by the palette engine, configuration and CLI.
//!
//! Nothing in here performs I/O or owns state. Commands carry their action
//! (either a built-in intent the engine executes, or an external callback),
//! categories carry their fixed display priority, and severities map to a
//! closed table of style tokens.

pub mod command;
pub mod error;
pub mod intent;
pub mod style;

pub use command::{Callback, Command, CommandAction, CommandCategory, CommandId};
pub use error::ActionError;
pub use intent::BuiltinAction;
pub use style::{Severity, StyleToken, Theme};
