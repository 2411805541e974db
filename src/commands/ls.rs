//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the git
//! repositories found under the storage root. It is a read-only operation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use repo_mirror::inventory::local_repos;

/// List the mirrors under the storage root
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to the repo-mirror.toml configuration file.
    #[arg(short, long, value_name = "FILE", env = "REPO_MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory that holds the mirrors, overriding `[local].path`.
    #[arg(long, value_name = "DIR", env = "REPO_MIRROR_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// Follow symbolic links while walking the storage root.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Show only the number of repositories.
    #[arg(long)]
    pub count: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let root = super::storage_root(args.storage_root, &config);

    let repos = local_repos(&root, args.follow_symlinks)
        .with_context(|| format!("Failed to list repositories under {}", root.display()))?;

    if args.count {
        println!("{}", repos.len());
        return Ok(());
    }

    if repos.is_empty() {
        println!("No repositories under {}.", root.display());
        return Ok(());
    }

    for repo in &repos {
        let shown = repo.strip_prefix(&root).unwrap_or(repo);
        println!("{}", shown.display());
    }

    println!();
    println!("{} repositories under {}", repos.len(), root.display());

    Ok(())
}
