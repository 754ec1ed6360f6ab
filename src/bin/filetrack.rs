//! # Filetrack CLI - Live file fingerprint monitor
//!
//! Watches a directory tree and shows, like `top`, every tracked file with
//! its last user, last change time, status and fingerprint history.
//!
//! ## Usage
//! ```bash
//! # Watch a directory
//! filetrack start --dir ./project
//!
//! # Also write a JSON-lines change log and keep compressed backups
//! filetrack start --dir ./project --log changes.jsonl --backup
//!
//! # Cap history and ignore build output
//! filetrack start --dir ./project --history-limit 20 --ignore "target/**"
//! ```

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use filetrack::{
    ChangeEvent, ChangeObserver, FileStatus, MonitorBuilder, Result, TrackError, TrackedFile,
    TrackerConfig, TrackingStore,
};
use humantime::format_duration;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default backup location, relative to the working directory
const DEFAULT_BACKUP_DIR: &str = ".filetrack-backup";

const FALLBACK_WIDTH: usize = 80;
const PATH_WIDTH: usize = 40;
const USER_WIDTH: usize = 12;
const TIME_WIDTH: usize = 19;
/// Column where history lines start (three columns plus separators)
const HISTORY_INDENT: usize = PATH_WIDTH + USER_WIDTH + TIME_WIDTH + 9;

/// Filetrack CLI - Real-time file fingerprint tracking
#[derive(Parser)]
#[command(name = "filetrack")]
#[command(author = "Mufeed VH <mufeed@asterisk.so>")]
#[command(version)]
#[command(about = "Track who changed which file, when, and to what content")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring a directory
    Start {
        /// Directory to monitor
        #[arg(short, long)]
        dir: PathBuf,

        /// Append every change to this JSON-lines file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Keep compressed copies of every observed file state
        #[arg(short, long)]
        backup: bool,

        /// Backup location (implies --backup)
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Extra ignore patterns (glob syntax)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Maximum history entries kept per file
        #[arg(long)]
        history_limit: Option<usize>,

        /// Load settings from a JSON file; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Append each refresh instead of clearing the screen
        #[arg(long)]
        no_clear: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they do not interleave with the listing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Start {
            dir,
            log,
            backup,
            backup_dir,
            ignore,
            history_limit,
            config,
            no_clear,
        } => {
            let mut config = match config {
                Some(path) => TrackerConfig::from_json_file(&path)?,
                None => TrackerConfig::default(),
            };
            config.root_path = dir;
            config.ignore_patterns.extend(ignore);
            if log.is_some() {
                config.log_file = log;
            }
            if backup_dir.is_some() {
                config.backup_dir = backup_dir;
            } else if backup && config.backup_dir.is_none() {
                config.backup_dir = Some(PathBuf::from(DEFAULT_BACKUP_DIR));
            }
            if history_limit.is_some() {
                config.history_limit = history_limit;
            }
            cmd_start(config, !no_clear)
        }
    }
}

/// Seed, render and follow changes until Ctrl+C
fn cmd_start(config: TrackerConfig, clear: bool) -> Result<()> {
    if !config.root_path.is_dir() {
        return Err(TrackError::InvalidRoot(config.root_path));
    }
    let root = config.root_path.canonicalize()?;
    let renderer = Arc::new(TerminalRenderer::new(root, clear));

    let monitor = MonitorBuilder::from_config(config)
        .observer(renderer)
        .build()?;

    let stop = monitor.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, stopping");
        stop.stop();
    })
    .map_err(|e| TrackError::internal(format!("Failed to install Ctrl+C handler: {}", e)))?;

    monitor.run()?;

    println!("\n{} Stopped monitoring", "✓".green().bold());
    Ok(())
}

/// Redraws the full listing whenever the store changes
struct TerminalRenderer {
    root: PathBuf,
    host: String,
    started: Instant,
    clear: bool,
}

impl TerminalRenderer {
    fn new(root: PathBuf, clear: bool) -> Self {
        Self {
            root,
            host: filetrack::utils::host_name(),
            started: Instant::now(),
            clear,
        }
    }

    fn render(&self, store: &TrackingStore) -> Result<()> {
        let snapshot = store.snapshot();
        let width = terminal_width();
        let uptime = Duration::from_secs(self.started.elapsed().as_secs());

        let stdout = io::stdout();
        let mut out = stdout.lock();

        if self.clear {
            clear_screen(&mut out)?;
        }

        writeln!(
            out,
            "\n{} {} on {} (Press Ctrl+C to stop)",
            "Monitoring:".cyan().bold(),
            self.root.display().to_string().cyan(),
            self.host.cyan()
        )?;
        writeln!(
            out,
            "Files: {}  Uptime: {}\n",
            snapshot.len().to_string().yellow(),
            format_duration(uptime)
        )?;
        writeln!(out, "{}", "=".repeat(width).magenta())?;
        writeln!(
            out,
            "{}",
            format!(
                "{} | {} | {} | Status",
                fit("File Path", PATH_WIDTH),
                fit("User", USER_WIDTH),
                fit("Last Modified", TIME_WIDTH)
            )
            .yellow()
        )?;
        writeln!(out, "{}", "=".repeat(width).magenta())?;

        for file in &snapshot {
            self.render_file(&mut out, file)?;
            writeln!(out, "{}", "-".repeat(width).magenta())?;
        }

        out.flush()?;
        Ok(())
    }

    fn render_file(&self, out: &mut impl Write, file: &TrackedFile) -> Result<()> {
        let relative = filetrack::utils::make_relative(&file.path, &self.root);
        writeln!(
            out,
            "{} | {} | {} | {}",
            fit(&relative.display().to_string(), PATH_WIDTH).blue().bold(),
            fit(&file.last_user, USER_WIDTH).green(),
            fit(&local_time(&file.last_timestamp), TIME_WIDTH).cyan(),
            colored_status(file.status)
        )?;

        for entry in &file.history {
            let hash = entry.hash.as_deref().unwrap_or("(unreadable)");
            writeln!(
                out,
                "{}↳ {} ({}, {})",
                " ".repeat(HISTORY_INDENT),
                hash.white().bold(),
                entry.user.green(),
                local_time(&entry.timestamp).bright_black()
            )?;
        }
        Ok(())
    }
}

impl ChangeObserver for TerminalRenderer {
    fn on_seeded(&self, store: &TrackingStore) -> Result<()> {
        self.render(store)
    }

    fn on_change(&self, _event: &ChangeEvent, store: &TrackingStore) -> Result<()> {
        self.render(store)
    }
}

fn colored_status(status: FileStatus) -> ColoredString {
    match status {
        FileStatus::Created => "Created".green(),
        FileStatus::Modified => "Modified".yellow(),
        FileStatus::Unchanged => "Unchanged".blue(),
        FileStatus::Deleted => "Deleted".red(),
    }
}

fn local_time(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Pad or left-truncate `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{:<width$}", text, width = width);
    }
    let tail: String = text.chars().skip(len - width + 1).collect();
    format!("…{}", tail)
}

/// Width of the attached terminal, or 80 columns when there is none
fn terminal_width() -> usize {
    width_or_fallback(terminal::size().ok())
}

fn width_or_fallback(size: Option<(u16, u16)>) -> usize {
    match size {
        Some((columns, _)) if columns > 0 => usize::from(columns),
        _ => FALLBACK_WIDTH,
    }
}

fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))
}
