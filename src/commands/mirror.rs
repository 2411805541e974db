//! # Mirror Command Implementation
//!
//! This module implements the `mirror` subcommand, the main operation of the
//! tool. It seeds a run with the remotes named in the configuration, any
//! remotes given on the command line and every configured GitHub
//! organization, then mirrors them and all their submodules.
//!
//! Individual repository failures are logged and counted; the run carries on
//! with everything else and the command still succeeds. Only configuration
//! and setup errors make it fail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use log::{info, warn};

use repo_mirror::coordinator::MirrorCoordinator;
use repo_mirror::driver::Driver;
use repo_mirror::vcs::GitCli;

/// Mirror repositories and their submodules
#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Additional remote addresses to mirror.
    #[arg(value_name = "REMOTE")]
    pub remotes: Vec<String>,

    /// Path to the repo-mirror.toml configuration file.
    ///
    /// Defaults to `repo-mirror.toml` in the current directory, if present.
    #[arg(short, long, value_name = "FILE", env = "REPO_MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory that holds the mirrors, overriding `[local].path`.
    #[arg(long, value_name = "DIR", env = "REPO_MIRROR_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// Number of worker threads, overriding `[local].workers`.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Show what would be mirrored without running git.
    #[arg(long)]
    pub dry_run: bool,

    /// The git executable to run.
    #[arg(long, value_name = "PATH", default_value = "git", env = "REPO_MIRROR_GIT")]
    pub git: PathBuf,
}

/// Execute the `mirror` command.
pub fn execute(args: MirrorArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let storage_root = super::storage_root(args.storage_root, &config);
    let workers = args
        .workers
        .map_or(config.local.workers, usize::from);

    let coordinator = MirrorCoordinator::new(
        &storage_root,
        config.local.aliases.clone(),
        Arc::new(GitCli::new(args.git)),
    )
    .with_dry_run(args.dry_run);

    let driver = Driver::new(coordinator, workers)?;
    driver.seed_from_config(&config)?;
    driver.seed(args.remotes);
    info!("Seeded {} tasks", driver.queued());

    let summary = driver.run()?;

    println!(
        "{} {} repositories into {} ({} tasks, {} failed)",
        if args.dry_run { "Would mirror" } else { "Mirrored" },
        summary.mirrored,
        storage_root.display(),
        summary.tasks.total(),
        summary.tasks.failed
    );

    if summary.tasks.failed > 0 {
        warn!(
            "{} of {} tasks failed, see the errors above",
            summary.tasks.failed,
            summary.tasks.total()
        );
    }

    Ok(())
}
