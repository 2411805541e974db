//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which parses and checks
//! a `repo-mirror.toml` file and reports what a `mirror` run would start
//! from. Nothing is cloned and no network requests are made.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use repo_mirror::defaults::DEFAULT_CONFIG_FILE;

/// Validate a repo-mirror.toml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file to validate.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE, env = "REPO_MIRROR_CONFIG")]
    pub config: PathBuf,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating configuration: {}", args.config.display());
    let config = super::load_config(Some(&args.config))?;
    println!("Configuration is valid");

    println!();
    println!("Storage root: {}", config.storage_root().display());
    println!("Workers: {}", config.local.workers);

    if !config.local.aliases.is_empty() {
        println!("Aliases:");
        for alias in &config.local.aliases {
            println!("   {} -> {}", alias.prefix, alias.replacement);
        }
    }

    println!("Remotes: {}", config.gather.remotes.len());
    for remote in &config.gather.remotes {
        println!("   {}", remote);
    }

    println!("GitHub organizations: {}", config.gather.github.len());
    for (org, github) in &config.gather.github {
        let mut notes = Vec::new();
        if !github.ignore.is_empty() {
            notes.push(format!("{} ignored", github.ignore.len()));
        }
        if github.auth_key_file.is_some() {
            notes.push("authenticated".to_string());
        }
        if github.dry_run {
            notes.push("dry run".to_string());
        }
        if notes.is_empty() {
            println!("   {}", org);
        } else {
            println!("   {} ({})", org, notes.join(", "));
        }
    }

    Ok(())
}
