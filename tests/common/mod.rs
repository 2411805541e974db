//! Shared test utilities for E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::EMPTY);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{fake_bare_repo, git};
    pub use super::TestFixture;
}

/// Common configuration snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Nothing to gather.
    pub const EMPTY: &str = "# repo-mirror configuration\n";

    /// Explicit remotes, aliases and a GitHub organization.
    pub const FULL: &str = r#"
[local]
path = "mirrors"
workers = 2

[local.aliases]
"https://github.com/" = "git@github.com:"

[gather]
remotes = ["ssh://git@example.com/org/repo.git", "git@example.com:org/tools.git"]

[gather.github.acme]
ignore = ["Archive"]
dry_run = true
"#;

    /// Unclosed table header.
    pub const INVALID_TOML: &str = "[local\npath = \"x\"\n";

    /// Parses, but fails validation.
    pub const ZERO_WORKERS: &str = "[local]\nworkers = 0\n";
}

/// A temporary directory with an optional `repo-mirror.toml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `repo-mirror.toml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("repo-mirror.toml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("repo-mirror.toml")
    }

    /// A command for the repo-mirror binary running in the fixture directory,
    /// isolated from the caller's environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-mirror");
        cmd.current_dir(self.path())
            .env_remove("REPO_MIRROR_CONFIG")
            .env_remove("REPO_MIRROR_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Lay out the skeleton of a bare repository at `path`.
#[allow(dead_code)]
pub fn fake_bare_repo(path: &Path) {
    fs::create_dir_all(path.join("objects")).expect("Failed to create objects");
    fs::create_dir_all(path.join("refs/heads")).expect("Failed to create refs");
    fs::write(path.join("HEAD"), "ref: refs/heads/main\n").expect("Failed to write HEAD");
}

/// Run git in `dir` with a fixed identity, panicking on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_TERMINAL_PROMPT", "0")
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}
