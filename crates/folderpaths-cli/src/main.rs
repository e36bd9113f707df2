#![deny(unsafe_code)]

mod commands;
mod config;
mod exit_code;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folderpaths_core::{ConfigError, FolderPathsError, FolderPathsService};

use crate::commands::{CommandContext, ensure, list, match_path, stats, watch};

/// Resolve paths to operating-system special folders
#[derive(Parser)]
#[command(name = "folderpaths")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Show every known special folder on this host
    folderpaths list

    # Which special folder contains this file?
    folderpaths match ~/Documents/reports/q3.xlsx

    # Create the Downloads folder if it is missing
    folderpaths ensure Downloads

    # Reload every 30 seconds and print changes
    folderpaths watch --interval 30s
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// When to use colored output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorChoice,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", env = "FOLDERPATHS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List special folders and their paths
    List(list::Args),

    /// Find the special folder containing each path
    Match(match_path::Args),

    /// Create special folders that do not exist yet
    Ensure(ensure::Args),

    /// Reload periodically and report changes
    Watch(watch::Args),

    /// Reload once and show reload statistics
    Stats(stats::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let (config, source) = config::load(cli.config.as_deref())?;
    tracing::debug!(source = %source.describe(), "Configuration loaded");

    let service = FolderPathsService::system(config).context("Invalid configuration")?;
    let ctx = CommandContext {
        service: &service,
        source: &source,
        color: cli.color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::List(args) => list::execute(&ctx, &args),
        Commands::Match(args) => match_path::execute(&ctx, &args),
        Commands::Ensure(args) => ensure::execute(&ctx, &args),
        Commands::Watch(args) => watch::execute(&ctx, &args),
        Commands::Stats(args) => stats::execute(&ctx, &args),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<match_path::NoMatch>().is_some() {
            return exit_code::NO_MATCH;
        }

        if cause.downcast_ref::<ConfigError>().is_some() {
            return exit_code::CONFIG_INVALID;
        }

        if let Some(err) = cause.downcast_ref::<FolderPathsError>() {
            return match err {
                FolderPathsError::InvalidArgument { .. } => exit_code::USAGE,
                FolderPathsError::EnvironmentUnavailable { .. }
                | FolderPathsError::ReloadTimedOut(_) => exit_code::ENVIRONMENT_UNAVAILABLE,
                FolderPathsError::UnknownFolder(_) | FolderPathsError::FolderUnresolved(_) => {
                    exit_code::NOT_FOUND
                }
                FolderPathsError::Materialize { message, .. } => {
                    if message.to_lowercase().contains("permission denied") {
                        exit_code::PERMISSION_DENIED
                    } else {
                        exit_code::GENERAL_ERROR
                    }
                }
            };
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::PermissionDenied => return exit_code::PERMISSION_DENIED,
                io::ErrorKind::Interrupted => return exit_code::CANCELLED,
                _ => {}
            }
        }
    }

    let msg = format!("{e:#}").to_lowercase();
    if msg.contains("config file") {
        exit_code::CONFIG_INVALID
    } else {
        exit_code::GENERAL_ERROR
    }
}
