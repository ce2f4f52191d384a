use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, API_URL_ENV, CONFIG_ENV};

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, ListArgs, NewArgs, ShowArgs};

pub const LOG_FILE: &str = "quicknote.log";

#[derive(Parser, Debug)]
#[command(
    name = "quicknote",
    version,
    about = "Keyboard-first terminal client for QuickNote"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over QUICKNOTE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the notes API (takes precedence over QUICKNOTE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print notes matching an optional search
    List(ListArgs),
    /// Print a single note
    Show(ShowArgs),
    /// Create a note
    New(NewArgs),
    /// Change selected fields of a note
    Edit(EditArgs),
    /// Delete a note after confirmation
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(url) = &cli.api_url {
        env::set_var(API_URL_ENV, url);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_target = match command {
        Commands::Tui => LogTarget::File(paths.log_dir.join(LOG_FILE)),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    tracing::debug!(api = %config.api.base_url, "configuration loaded");

    match command {
        Commands::Tui => {
            let mut app = App::new(config, &paths)?;
            commands::run_tui(&mut app)
        }
        Commands::List(args) => commands::list_notes(&config, args),
        Commands::Show(args) => commands::show_note(&config, args),
        Commands::New(args) => commands::new_note(&config, args),
        Commands::Edit(args) => commands::edit_note(&config, args),
        Commands::Delete(args) => commands::delete_note(&config, args),
    }
}

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?))
                .init(),
        }
        Ok(())
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
