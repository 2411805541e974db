//! # Version-Control Executor
//!
//! The mirroring logic never runs `git` itself. It talks to a [`VcsExecutor`],
//! which has exactly the three operations a mirror needs: make a mirror
//! clone, refresh an existing mirror, and read one file from the mirrored
//! head. [`GitCli`] implements them with the system `git` binary. Tests
//! swap in a recording mock.
//!
//! Using the system binary means authentication works the way it does for
//! the user on the command line:
//! - SSH keys from ~/.ssh/ and the ssh-agent
//! - Git credential helpers
//! - Any url rewriting configured in ~/.gitconfig

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, info};

use crate::error::{Error, Result};

/// Result of reading a file from the head commit of a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadFile {
    /// The file exists at `HEAD`; its text.
    Present(String),
    /// The file is not in `HEAD`, or the repository has no commits yet.
    Absent,
    /// The path is not a git repository at all.
    NotARepository,
}

/// Version-control operations used by the mirror coordinator.
pub trait VcsExecutor: Send + Sync {
    /// Make a mirror clone of `remote` at `local`. `local` must not exist.
    fn mirror_clone(&self, remote: &str, local: &Path) -> Result<()>;

    /// Fetch all remotes of the existing mirror at `local`.
    fn remote_update(&self, local: &Path) -> Result<()>;

    /// Read `filename` from the head commit of the repository at `local`.
    ///
    /// Expected absences are reported through [`HeadFile`]; only unexpected
    /// failures are errors.
    fn read_head_file(&self, local: &Path, filename: &str) -> Result<HeadFile>;
}

/// [`VcsExecutor`] backed by the `git` command-line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    /// Use `program` as the git binary
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        // A credential prompt would block a worker forever
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    /// Run git against the bare repository at `git_dir`
    fn git_dir_output<I, S>(&self, git_dir: &Path, args: I, label: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command()
            .arg("--git-dir")
            .arg(git_dir)
            .args(args)
            .output()
            .map_err(|e| Error::GitCommand {
                command: label.to_string(),
                path: git_dir.to_path_buf(),
                stderr: e.to_string(),
            })
    }
}

impl VcsExecutor for GitCli {
    fn mirror_clone(&self, remote: &str, local: &Path) -> Result<()> {
        if let Some(parent) = local.parent() {
            if !parent.is_dir() {
                info!("Creating directory {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }

        info!("Cloning {} to {}", remote, local.display());
        let output = self
            .command()
            .args(["clone", "--mirror", "--quiet", remote])
            .arg(local)
            .output()
            .map_err(|e| Error::GitClone {
                url: remote.to_string(),
                path: local.to_path_buf(),
                message: e.to_string(),
                hint: None,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let hint = auth_hint(&stderr);
            return Err(Error::GitClone {
                url: remote.to_string(),
                path: local.to_path_buf(),
                message: format!("exit {}: {}", exit_code(&output), stderr),
                hint,
            });
        }

        Ok(())
    }

    fn remote_update(&self, local: &Path) -> Result<()> {
        info!("Updating {}", local.display());
        let output = self.git_dir_output(local, ["remote", "update"], "remote update")?;

        if !output.status.success() {
            return Err(Error::GitCommand {
                command: "remote update".to_string(),
                path: local.to_path_buf(),
                stderr: format!(
                    "exit {}: {}",
                    exit_code(&output),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }

    fn read_head_file(&self, local: &Path, filename: &str) -> Result<HeadFile> {
        let spec = format!("HEAD:{}", filename);
        let output = self.git_dir_output(
            local,
            ["rev-parse", "--verify", "--quiet", spec.as_str()],
            "rev-parse",
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Ok(HeadFile::NotARepository);
            }
            // --quiet keeps an unresolvable name silent: no commits yet, or
            // no such file at HEAD
            if stderr.trim().is_empty() {
                debug!("{} not present at HEAD of {}", filename, local.display());
                return Ok(HeadFile::Absent);
            }
            return Err(Error::GitCommand {
                command: format!("rev-parse {}", spec),
                path: local.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        let oid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let output = self.git_dir_output(local, ["cat-file", "blob", oid.as_str()], "cat-file")?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command: format!("cat-file blob {}", oid),
                path: local.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(HeadFile::Present(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

fn exit_code(output: &Output) -> String {
    output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Hint for the failures that almost always mean missing credentials
fn auth_hint(stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
        || stderr.contains("terminal prompts disabled")
    {
        Some(
            "make sure you have access to the repository: an SSH key loaded in \
             ssh-agent, a git credential helper, or a personal access token"
                .to_string(),
        )
    } else {
        None
    }
}
