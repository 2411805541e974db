//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `repo-mirror` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `repo_mirror` library.

pub mod ls;
pub mod mirror;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use repo_mirror::config::Config;
use repo_mirror::defaults::DEFAULT_CONFIG_FILE;

/// Load the configuration for a command.
///
/// An explicit path must exist. Without one, `repo-mirror.toml` in the current
/// directory is used if present, and an empty configuration otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                log::debug!("No {} found, using an empty configuration", DEFAULT_CONFIG_FILE);
                return Ok(Config::default());
            }
            default
        }
    };

    Config::from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// `--storage-root` if given, else the configured or default root
pub fn storage_root(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.storage_root())
}
