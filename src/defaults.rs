//! Default values for repo-mirror configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Configuration file looked up in the current directory when `--config`
/// is not given.
pub const DEFAULT_CONFIG_FILE: &str = "repo-mirror.toml";

/// Worker threads used when `[local].workers` is not set.
pub const DEFAULT_WORKERS: usize = 4;

/// Base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Returns the default storage root for mirrors.
///
/// Uses the platform-appropriate local data directory:
/// - Linux: `~/.local/share/repo-mirror` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/repo-mirror`
/// - Windows: `{FOLDERID_LocalAppData}\repo-mirror`
///
/// Falls back to `git` in the current directory if the platform directory
/// cannot be determined.
///
/// This can be overridden by `[local].path` in the configuration file or the
/// `--storage-root` CLI flag.
pub fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("repo-mirror"))
        .unwrap_or_else(|| PathBuf::from("git"))
}
