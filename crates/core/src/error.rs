use std::fmt;

/// Failure reported by a command's bound callback.
///
/// Callbacks are fire-and-forget UI effects: the engine logs the failure and
/// keeps going, the owning module decides how to tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The callback returned an error.
    Failed(String),
    /// The callback panicked; the payload message when one was available.
    Panicked(String),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(msg) => write!(f, "action failed: {msg}"),
            Self::Panicked(msg) => write!(f, "action panicked: {msg}"),
        }
    }
}

impl std::error::Error for ActionError {}
