//! # Configuration File
//!
//! This module defines the structure of the `repo-mirror.toml` configuration
//! file and the logic for loading and validating it.
//!
//! ```toml
//! [local]
//! path = "/srv/mirrors"     # storage root; `git = ...` is accepted too
//! workers = 4
//!
//! [local.aliases]           # prefix rewrites, first match wins
//! "https://github.com/" = "git@github.com:"
//!
//! [gather]
//! remotes = ["ssh://git@example.com/org/repo.git"]
//!
//! [gather.github.acme]
//! auth_key_file = "github.key"
//! ignore = ["Archive"]
//! ```
//!
//! ## Key Components
//!
//! - **`Config`**: The whole file.
//! - **`LocalConfig`**: Where mirrors live, how many workers run, and the
//!   ordered list of address aliases.
//! - **`GatherConfig`**: Where the initial set of remotes comes from: an
//!   explicit list plus any number of GitHub organizations.
//!
//! Every section and key is optional; an empty file is a valid configuration
//! that mirrors nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::defaults::{default_storage_root, DEFAULT_WORKERS};
use crate::error::{Error, Result};

/// The whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub gather: GatherConfig,
}

/// The `[local]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    /// Root directory for mirrors.
    #[serde(default, alias = "git")]
    pub path: Option<PathBuf>,
    /// Number of worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Address prefix rewrites, in file order.
    #[serde(default, deserialize_with = "ordered_aliases")]
    pub aliases: Vec<Alias>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: None,
            workers: DEFAULT_WORKERS,
            aliases: Vec::new(),
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// A single prefix rewrite from `[local.aliases]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub prefix: String,
    pub replacement: String,
}

/// The `[gather]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatherConfig {
    /// Remotes to mirror explicitly.
    #[serde(default)]
    pub remotes: Vec<String>,
    /// GitHub organizations, keyed by organization name.
    #[serde(default)]
    pub github: BTreeMap<String, GithubConfig>,
}

/// One `[gather.github.<org>]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubConfig {
    /// File whose first line is a GitHub access token.
    #[serde(default)]
    pub auth_key_file: Option<PathBuf>,
    /// Repository names to skip, compared case-insensitively.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Log what would be mirrored instead of mirroring it.
    #[serde(default)]
    pub dry_run: bool,
    /// Override for the API base URL (GitHub Enterprise).
    #[serde(default)]
    pub api_url: Option<String>,
}

// A HashMap would lose the file order that "first match wins" depends on.
fn ordered_aliases<'de, D>(deserializer: D) -> std::result::Result<Vec<Alias>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AliasVisitor;

    impl<'de> Visitor<'de> for AliasVisitor {
        type Value = Vec<Alias>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of \"prefix\" = \"replacement\" strings")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut aliases = Vec::new();
            while let Some((prefix, replacement)) = map.next_entry::<String, String>()? {
                aliases.push(Alias {
                    prefix,
                    replacement,
                });
            }
            Ok(aliases)
        }
    }

    deserializer.deserialize_map(AliasVisitor)
}

impl Config {
    /// Parse and validate a configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            hint: if e.kind() == std::io::ErrorKind::NotFound {
                Some("pass --config or create repo-mirror.toml".to_string())
            } else {
                None
            },
        })?;
        Self::parse(&content)
    }

    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.local.workers == 0 {
            return Err(Error::Config {
                message: "[local].workers must be at least 1".to_string(),
                hint: None,
            });
        }

        if self.local.aliases.iter().any(|a| a.prefix.is_empty()) {
            return Err(Error::Config {
                message: "empty alias prefix in [local.aliases]".to_string(),
                hint: Some("an empty prefix would match every address".to_string()),
            });
        }

        for (org, github) in &self.gather.github {
            if org.trim().is_empty() {
                return Err(Error::Config {
                    message: "empty organization name in [gather.github]".to_string(),
                    hint: None,
                });
            }
            if let Some(api_url) = &github.api_url {
                url::Url::parse(api_url).map_err(|e| Error::Config {
                    message: format!("invalid api_url for {}: {}", org, e),
                    hint: None,
                })?;
            }
        }

        Ok(())
    }

    /// The storage root: `[local].path`, or the platform default
    pub fn storage_root(&self) -> PathBuf {
        self.local.path.clone().unwrap_or_else(default_storage_root)
    }
}
