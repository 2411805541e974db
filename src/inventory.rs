//! Inventory of the mirrors already under a storage root

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::Result;

/// Check whether `path` looks like a git directory: a `HEAD` plus `objects/`
/// and `refs/` directories.
pub fn is_git_dir(path: &Path) -> bool {
    let head = path.join("HEAD");
    (head.is_file() || head.is_symlink())
        && path.join("objects").is_dir()
        && path.join("refs").is_dir()
}

/// Every git repository under `root`, sorted by path.
///
/// Bare repositories are reported by their own path, working copies by the
/// directory holding `.git`. The walk does not descend into a repository
/// once it has found one. Symbolic links to directories are only followed
/// when `follow_symlinks` is set.
pub fn local_repos(root: &Path, follow_symlinks: bool) -> Result<Vec<PathBuf>> {
    let mut repos = Vec::new();
    if !root.is_dir() {
        debug!("Storage root {} does not exist", root.display());
        return Ok(repos);
    }

    let mut walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if is_git_dir(path) || is_git_dir(&path.join(".git")) {
            debug!("Found repository {}", path.display());
            repos.push(path.to_path_buf());
            walker.skip_current_dir();
        }
    }

    Ok(repos)
}
