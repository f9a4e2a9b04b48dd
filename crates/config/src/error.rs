use std::fmt;

/// Failure loading or validating a module layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Structural problem in an otherwise well-formed layout.
    Validation(String),
    /// No built-in layout with that module id.
    UnknownModule(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "layout parse error: {msg}"),
            Self::Validation(msg) => write!(f, "layout validation error: {msg}"),
            Self::UnknownModule(module) => write!(f, "unknown module: {module}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure reading or writing the key-value persistence surface.
#[derive(Debug)]
pub enum StoreError {
    Io { key: String, source: std::io::Error },
    /// Value is present but is not the expected JSON shape.
    Malformed { key: String, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { key, source } => write!(f, "storage error for '{key}': {source}"),
            Self::Malformed { key, message } => {
                write!(f, "malformed value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } => None,
        }
    }
}
