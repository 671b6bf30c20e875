//! foldersync CLI - Command-line interface for foldersync
//!
//! Provides commands for:
//! - Refreshing the local folder list from a JMAP server
//! - Listing the stored folders and sync cursor
//! - Viewing, validating and creating the configuration file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use foldersync_core::config::Config;
use foldersync_core::domain::{ErrorKind, SyncError};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, folders::FoldersCommand, refresh::RefreshCommand};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "foldersync",
    version,
    about = "Incremental JMAP mail folder synchronization"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bring the local folder list up to date with the server
    Refresh(RefreshCommand),
    /// List stored folders and sync cursors
    Folders(FoldersCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Picks the log filter from the flags, falling back to the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let filter = log_filter(cli.verbose, cli.quiet, &config.logging.level);
    // RUST_LOG wins over flags and config
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Process exit status for a failed command
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SyncError>().map(SyncError::kind) {
        Some(ErrorKind::Authentication) => 2,
        Some(ErrorKind::PermanentProtocol) => 3,
        Some(ErrorKind::Transport) => 4,
        Some(ErrorKind::Storage) => 5,
        None => 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    init_tracing(&cli, &config);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let result = match &cli.command {
        Commands::Refresh(cmd) => cmd.execute(&config, format).await,
        Commands::Folders(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    };

    if let Err(err) = result {
        get_formatter(cli.json).error(&format!("{err:#}"));
        std::process::exit(exit_code(&err));
    }

    Ok(())
}
