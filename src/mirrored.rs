//! Run-wide record of local mirror targets already claimed

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// The set of local targets claimed during one run.
///
/// A target is claimed before any I/O happens for it, and claims are never
/// released. Two tasks racing on the same target therefore always resolve to
/// one winner, and a repository reachable through several submodule paths
/// (or through a cycle) is mirrored once.
#[derive(Debug, Clone, Default)]
pub struct MirroredSet {
    claimed: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MirroredSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically test and claim `target`.
    ///
    /// Returns `true` if this call claimed it, `false` if it was already
    /// claimed.
    pub fn claim(&self, target: &Path) -> Result<bool> {
        let mut claimed = self.claimed.lock().map_err(|_| Error::LockPoisoned {
            context: "mirrored set".to_string(),
        })?;
        Ok(claimed.insert(target.to_path_buf()))
    }

    /// Check whether `target` has been claimed
    pub fn contains(&self, target: &Path) -> Result<bool> {
        let claimed = self.claimed.lock().map_err(|_| Error::LockPoisoned {
            context: "mirrored set".to_string(),
        })?;
        Ok(claimed.contains(target))
    }

    /// Number of claimed targets
    pub fn len(&self) -> Result<usize> {
        let claimed = self.claimed.lock().map_err(|_| Error::LockPoisoned {
            context: "mirrored set".to_string(),
        })?;
        Ok(claimed.len())
    }

    /// Check if nothing has been claimed yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
