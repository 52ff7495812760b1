//! Error types for the tailtray utility
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the tailtray application
#[derive(Error, Debug)]
pub enum TailtrayError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while running external commands
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Errors from the single-instance guard
    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),

    /// Errors from the git based self-update
    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// External command errors
///
/// A non-zero exit status is not an error: it is reported as data on the
/// invocation result and callers decide what it means.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Cannot run an empty command")]
    EmptyCommand,

    #[error("Failed to launch {program}: {reason}")]
    LaunchFailed { program: String, reason: String },

    #[error("Failed to read output of {program}: {reason}")]
    OutputFailed { program: String, reason: String },

    #[error("Failed to wait for {program}: {reason}")]
    WaitFailed { program: String, reason: String },

    #[error("{program} was cancelled")]
    Cancelled { program: String },
}

/// Single-instance guard errors
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("tailtray is already running with PID {pid}")]
    AlreadyRunning { pid: i32 },

    #[error("Failed to access PID file {path}: {reason}")]
    PidFile { path: String, reason: String },
}

/// Self-update errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("git is not available on PATH")]
    GitUnavailable,

    #[error("No repository directory configured for self-update")]
    NoRepository,

    #[error("Unable to read the current revision")]
    RevisionUnavailable,

    #[error("git pull --rebase failed with exit code {code}")]
    PullFailed { code: i32 },

    #[error("Failed to run git: {0}")]
    Git(#[from] ProcessError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TailtrayError>;
