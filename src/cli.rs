//! CLI argument parsing, logging setup and command dispatch

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::commands;

/// Repo Mirror - Keep local mirrors of git repositories and all their submodules
#[derive(Parser, Debug)]
#[command(name = "repo-mirror")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Set log level; overrides -v
    #[arg(long, global = true, value_name = "LEVEL", value_enum)]
    log_level: Option<LogLevel>,

    /// Write log output to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror the configured repositories and every submodule they reference
    Mirror(commands::mirror::MirrorArgs),

    /// List the mirrors present under the storage root
    Ls(commands::ls::LsArgs),

    /// Validate a repo-mirror.toml configuration file
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging()?;

        match self.command {
            Commands::Mirror(args) => commands::mirror::execute(args),
            Commands::Ls(args) => commands::ls::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
        }
    }

    fn init_logging(&self) -> Result<()> {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(self.level())
            .format_timestamp_secs()
            .parse_default_env();

        if let Some(path) = &self.log_file {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        builder
            .try_init()
            .context("Failed to initialise logging")
    }

    fn level(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, 0) => LevelFilter::Warn,
            (None, 1) => LevelFilter::Info,
            (None, _) => LevelFilter::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::parse_from(["repo-mirror", "ls"]);
        assert_eq!(cli.level(), LevelFilter::Warn);

        let cli = Cli::parse_from(["repo-mirror", "-v", "ls"]);
        assert_eq!(cli.level(), LevelFilter::Info);

        let cli = Cli::parse_from(["repo-mirror", "ls", "-vvv"]);
        assert_eq!(cli.level(), LevelFilter::Debug);
    }

    #[test]
    fn test_log_level_overrides_verbose() {
        let cli = Cli::parse_from(["repo-mirror", "-vv", "--log-level", "error", "ls"]);
        assert_eq!(cli.level(), LevelFilter::Error);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["repo-mirror", "--log-level", "loud", "ls"]).is_err());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["repo-mirror"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
