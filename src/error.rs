//! # Error Handling
//!
//! This module defines the centralized error type for `repo-mirror`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! failure the library can report, each variant carrying enough context
//! (remote address, local path, command, stderr) to diagnose the failure
//! from a log line alone.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum for all library failures.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Most of these errors never reach the user directly. Failures raised inside
//! a queued task are logged at the task boundary and the run continues; only
//! configuration and setup errors propagate out of the `mirror` command.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for repo-mirror operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be understood.
    ///
    /// This error includes the specific issue and optionally a hint about how
    /// to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// `git clone --mirror` failed for a remote.
    #[error("Git clone error for {url} into {}: {message}{}", path.display(), hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        path: PathBuf,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// Any other git invocation exited unsuccessfully or could not be started.
    #[error("Git command failed in {}: {command} - {stderr}", path.display())]
    GitCommand {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    /// A local target that should hold a mirror is not a git repository.
    #[error("Not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    /// A remote address has no local target of its own under the storage root.
    #[error("Invalid remote address {address:?}: {message}")]
    InvalidAddress { address: String, message: String },

    /// A repository source provider could not list its repositories.
    #[error("Repository source {source_name} failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// The task queue could not be started.
    #[error("Task queue error: {message}")]
    Queue { message: String },

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An HTTP transport error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON decoding error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
