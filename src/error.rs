//! Error types for launchspec
//!
//! Every failure is load-time and fatal to the load. Errors carry the app
//! name so a multi-app ecosystem file reports which entry is broken.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while loading a launch descriptor
#[derive(Debug, Error)]
pub enum LoadError {
    /// The app has no name
    #[error("App name cannot be empty")]
    MissingName,

    /// No script was given
    #[error("App '{app}': no command to launch")]
    MissingCommand { app: String },

    /// Instance count below one
    #[error("App '{app}': instances must be >= 1, got {value}")]
    InvalidInstanceCount { app: String, value: i64 },

    /// A `${VAR}` placeholder names a variable absent from the environment
    #[error("App '{app}': environment variable '{variable}' is not set")]
    MissingVariable { app: String, variable: String },

    /// A `${` without a closing brace, or an empty/invalid variable name
    #[error("App '{app}': malformed placeholder in '{text}'")]
    MalformedPlaceholder { app: String, text: String },

    /// max_memory_restart could not be parsed as a byte size
    #[error("App '{app}': invalid max_memory_restart '{value}'")]
    InvalidMemoryThreshold { app: String, value: String },

    /// ignore_watch entry is not a valid glob
    #[error("App '{app}': invalid ignore_watch pattern '{pattern}': {reason}")]
    InvalidWatchPattern {
        app: String,
        pattern: String,
        reason: String,
    },

    /// The command does not resolve to an executable
    #[error("App '{app}': command '{command}' is not an executable reachable from PATH")]
    UnresolvedExecutable { app: String, command: String },

    /// Two apps in one ecosystem share a name
    #[error("Duplicate app name: {0}")]
    DuplicateName(String),

    /// Ecosystem file declares no apps
    #[error("No apps declared in {}", .0.display())]
    EmptyEcosystem(PathBuf),

    /// A single descriptor was requested from a file holding several apps
    #[error("{} declares {count} apps, expected exactly one", .path.display())]
    MultipleApps { path: PathBuf, count: usize },

    /// Descriptor file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor file could not be parsed
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

impl LoadError {
    /// Name of the app the error refers to, when there is one
    pub fn app(&self) -> Option<&str> {
        match self {
            LoadError::MissingCommand { app }
            | LoadError::InvalidInstanceCount { app, .. }
            | LoadError::MissingVariable { app, .. }
            | LoadError::MalformedPlaceholder { app, .. }
            | LoadError::InvalidMemoryThreshold { app, .. }
            | LoadError::InvalidWatchPattern { app, .. }
            | LoadError::UnresolvedExecutable { app, .. } => Some(app.as_str()),
            LoadError::DuplicateName(app) => Some(app.as_str()),
            _ => None,
        }
    }
}

/// Result type alias for launchspec operations
pub type Result<T> = std::result::Result<T, LoadError>;
