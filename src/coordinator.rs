//! # Mirror Coordinator
//!
//! One call to [`MirrorCoordinator::mirror`] handles one remote address from
//! start to finish:
//!
//! 1. Rewrite the address with the first matching alias.
//! 2. Parse it and work out its local target under the storage root.
//! 3. Claim the target. A target claimed by an earlier or concurrent task is
//!    skipped, which is what stops shared submodules and cycles from being
//!    mirrored twice.
//! 4. Clone the remote if the target does not exist yet, otherwise update it.
//! 5. Read `.gitmodules` from the mirrored head and submit one follow-up
//!    task per submodule URL it lists.
//!
//! A failure at step 4 or 5 ends the task and leaves the target claimed, so
//! nothing is retried within a run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use log::{debug, info};
use regex::Regex;

use crate::address::RemoteAddress;
use crate::config::Alias;
use crate::driver::Job;
use crate::error::{Error, Result};
use crate::mirrored::MirroredSet;
use crate::queue::TaskQueue;
use crate::vcs::{HeadFile, VcsExecutor};

/// File in the head commit that lists submodules
pub const SUBMODULES_FILE: &str = ".gitmodules";

static SUBMODULE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*url\s*=\s*(.*)$").expect("submodule url pattern is valid"));

/// What one call to [`MirrorCoordinator::mirror`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Another task had already claimed the target.
    Skipped { target: PathBuf },
    /// A new mirror was cloned; `submodules` follow-up tasks were submitted.
    Cloned { target: PathBuf, submodules: usize },
    /// An existing mirror was updated; `submodules` follow-up tasks were
    /// submitted.
    Updated { target: PathBuf, submodules: usize },
    /// Dry run: the target was claimed but the VCS was not touched.
    DryRun { target: PathBuf },
}

/// Mirrors single remotes and fans out to their submodules.
///
/// Shared by every worker for the length of a run.
pub struct MirrorCoordinator {
    storage_root: PathBuf,
    aliases: Vec<Alias>,
    vcs: Arc<dyn VcsExecutor>,
    mirrored: MirroredSet,
    dry_run: bool,
}

impl MirrorCoordinator {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        aliases: Vec<Alias>,
        vcs: Arc<dyn VcsExecutor>,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            aliases,
            vcs,
            mirrored: MirroredSet::new(),
            dry_run: false,
        }
    }

    /// Claim targets and log them without cloning or updating anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Targets claimed so far in this run
    pub fn mirrored(&self) -> &MirroredSet {
        &self.mirrored
    }

    /// Mirror `raw` and submit a task for each of its submodules.
    pub fn mirror(&self, raw: &str, queue: &TaskQueue<Job>) -> Result<MirrorOutcome> {
        let remote = self.apply_alias(raw);
        let address = RemoteAddress::parse(&remote);
        let target = address.local_path(&self.storage_root);
        if target == self.storage_root {
            return Err(Error::InvalidAddress {
                address: remote,
                message: format!("resolves to the storage root {}", target.display()),
            });
        }

        if !self.mirrored.claim(&target)? {
            info!("Skipping {}, {} already mirrored", remote, target.display());
            return Ok(MirrorOutcome::Skipped { target });
        }

        if self.dry_run {
            info!("Would mirror {} to {}", remote, target.display());
            return Ok(MirrorOutcome::DryRun { target });
        }

        let cloned = if target.exists() {
            self.vcs.remote_update(&target)?;
            false
        } else {
            self.vcs.mirror_clone(&remote, &target)?;
            true
        };

        let submodules = match self.vcs.read_head_file(&target, SUBMODULES_FILE)? {
            HeadFile::Present(text) => submodule_urls(&text),
            HeadFile::Absent => Vec::new(),
            HeadFile::NotARepository => return Err(Error::NotARepository { path: target }),
        };

        for url in &submodules {
            let url = resolve_submodule(&address, url);
            queue.submit(
                Job::Mirror {
                    address: url.clone(),
                },
                format!("Submodule {}", url),
            );
        }

        let submodules = submodules.len();
        Ok(if cloned {
            MirrorOutcome::Cloned { target, submodules }
        } else {
            MirrorOutcome::Updated { target, submodules }
        })
    }

    /// Replace the first matching alias prefix, if any
    fn apply_alias(&self, raw: &str) -> String {
        for alias in &self.aliases {
            if let Some(rest) = raw.strip_prefix(alias.prefix.as_str()) {
                let rewritten = format!("{}{}", alias.replacement, rest);
                debug!("Aliased {} to {}", raw, rewritten);
                return rewritten;
            }
        }
        raw.to_string()
    }
}

/// Every submodule URL in a `.gitmodules` text, in file order
pub fn submodule_urls(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| SUBMODULE_URL.captures(line))
        .map(|caps| caps[1].trim_end().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

/// Resolve a submodule URL recorded relative to its parent's address
fn resolve_submodule(parent: &RemoteAddress, url: &str) -> String {
    if url.starts_with('/') || url.starts_with("../") {
        parent.join(url).deparse()
    } else {
        url.to_string()
    }
}
