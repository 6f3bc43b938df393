//! # snapvc CLI - snapshot versioning for a directory
//!
//! ## Usage
//! ```bash
//! # Initialize in the current directory
//! snapvc init
//!
//! # Record a version (tag optional, defaults to a timestamp)
//! snapvc commit -m "Initial state" -t v1
//!
//! # What changed since the last commit
//! snapvc status
//!
//! # History, newest first
//! snapvc log
//!
//! # Line diffs against a version (defaults to the latest)
//! snapvc diff v1
//!
//! # Go back; refuses over uncommitted changes unless --force
//! snapvc restore v1 --force
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use snapvc::diff::render_file;
use snapvc::{
    format_bytes, DiffKind, DiffOptions, Repository, Result, SnapError,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// snapvc - local snapshot versioning
#[derive(Parser)]
#[command(name = "snapvc")]
#[command(version)]
#[command(about = "Record, inspect, diff and restore full snapshots of a directory")]
#[command(long_about = None)]
struct Cli {
    /// Repository root (defaults to the current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository
    Init,

    /// Show files changed since the last commit
    #[command(alias = "st")]
    Status,

    /// Save a snapshot of the working tree
    #[command(alias = "ci")]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Version tag (e.g. v1.0); defaults to a timestamp
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Show history, newest first
    Log {
        /// Limit results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Replace the working tree with a recorded version
    Restore {
        /// Version tag to restore
        version: String,

        /// Overwrite uncommitted changes
        #[arg(long)]
        force: bool,

        /// Show progress
        #[arg(long)]
        progress: bool,
    },

    /// Show line diffs against a version
    Diff {
        /// Version to diff against (defaults to the latest commit)
        version: Option<String>,

        /// Number of context lines to show
        #[arg(long, default_value = "3")]
        context: usize,

        /// Show only statistics
        #[arg(long)]
        stat: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

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
    let root = match cli.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(root),
        Commands::Status => cmd_status(root),
        // An empty tag means "generate one"
        Commands::Commit { message, tag } => {
            cmd_commit(root, message, tag.filter(|t| !t.is_empty()))
        }
        Commands::Log { limit } => cmd_log(root, limit),
        Commands::Restore {
            version,
            force,
            progress,
        } => cmd_restore(root, version, force, progress),
        Commands::Diff {
            version,
            context,
            stat,
        } => cmd_diff(root, version, context, stat),
    }
}

/// An existing repository is left alone with a warning
fn cmd_init(root: PathBuf) -> Result<()> {
    match Repository::init(&root) {
        Ok(repo) => {
            println!(
                "{} Initialized repository in {}",
                "✓".green().bold(),
                repo.root().display().to_string().cyan()
            );
            println!("\nNext steps:");
            println!(
                "  - Record your first version: {}",
                "snapvc commit -m \"Initial state\" -t v1".yellow()
            );
            Ok(())
        }
        Err(SnapError::RepositoryAlreadyExists(path)) => {
            println!(
                "{} Repository already exists in {}",
                "!".yellow().bold(),
                path.display()
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_status(root: PathBuf) -> Result<()> {
    let repo = Repository::open(&root)?;
    warn_if_corrupted(&repo)?;

    let Some(report) = repo.status()? else {
        println!("{}", "No commits yet. Nothing to compare.".yellow());
        return Ok(());
    };

    if report.is_clean() {
        println!(
            "{} Working tree clean (version {})",
            "✓".green().bold(),
            report.base_version.yellow()
        );
        return Ok(());
    }

    println!("On version: {}", report.base_version.yellow().bold());
    if !report.modified.is_empty() {
        println!("\n{}", "Changed files:".yellow().bold());
        for path in &report.modified {
            println!("  M {}", path.yellow());
        }
    }
    if !report.added.is_empty() {
        println!("\n{}", "New files:".green().bold());
        for path in &report.added {
            println!("  + {}", path.green());
        }
    }
    if !report.deleted.is_empty() {
        println!("\n{}", "Deleted files:".red().bold());
        for path in &report.deleted {
            println!("  - {}", path.red());
        }
    }
    Ok(())
}

fn cmd_commit(root: PathBuf, message: String, tag: Option<String>) -> Result<()> {
    let repo = Repository::open(&root)?;
    warn_if_corrupted(&repo)?;

    let start = Instant::now();
    let record = repo.commit(&message, tag.as_deref())?;

    println!(
        "{} Snapshot saved: [{}] {}",
        "✓".green().bold(),
        record.label().yellow().bold(),
        record.message.cyan()
    );
    println!("  Files: {}", record.file_count().to_string().cyan());
    println!("  Time: {}", format_duration(rounded(start.elapsed())).to_string().cyan());
    Ok(())
}

fn cmd_log(root: PathBuf, limit: Option<usize>) -> Result<()> {
    let repo = Repository::open(&root)?;
    let history = repo.log()?;

    if let Some(warning) = &history.warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
    if history.entries.is_empty() {
        println!("{}", "No snapshots found.".yellow());
        return Ok(());
    }

    let display_count = limit.unwrap_or(history.entries.len()).min(history.entries.len());
    for entry in history.entries.iter().take(display_count) {
        println!("Version: {}", entry.label.yellow().bold());
        println!("Date:    {}", entry.timestamp.dimmed());
        println!("Message: {}", entry.message.cyan());
        println!("Files:   {}", entry.file_count);
        println!("{}", "-".repeat(30).dimmed());
    }

    if display_count < history.entries.len() {
        println!(
            "{}",
            format!("Showing {} of {} versions", display_count, history.entries.len()).dimmed()
        );
    }
    Ok(())
}

fn cmd_restore(root: PathBuf, version: String, force: bool, show_progress: bool) -> Result<()> {
    let repo = Repository::open(&root)?;
    warn_if_corrupted(&repo)?;

    println!("{} {}", "Restoring version".blue().bold(), version.yellow());

    let progress = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Restoring files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = repo.restore(&version, force);
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    println!("{} Restored to {}", "✓".green().bold(), result.version.yellow().bold());
    println!("  Files restored: {}", result.files_restored.to_string().cyan());
    println!("  Entries removed: {}", result.entries_removed.to_string().yellow());
    println!("  Bytes written: {}", format_bytes(result.bytes_written).cyan());
    println!(
        "  Time: {}",
        format_duration(Duration::from_millis(result.duration_ms)).to_string().cyan()
    );
    Ok(())
}

fn cmd_diff(root: PathBuf, version: Option<String>, context: usize, stat_only: bool) -> Result<()> {
    let repo = Repository::open(&root)?;
    warn_if_corrupted(&repo)?;

    let options = DiffOptions {
        context_lines: context,
        ..Default::default()
    };
    let report = repo.diff(version.as_deref(), &options)?;

    println!("{} {}\n", "Diffing against".blue().bold(), report.version.yellow());
    if report.is_empty() {
        println!("{}", "No differences.".green());
        return Ok(());
    }

    for file in &report.files {
        match &file.kind {
            DiffKind::Modified {
                lines_added,
                lines_deleted,
                ..
            } if stat_only => {
                println!(
                    "  ~ {} {} {}",
                    file.path,
                    format!("+{}", lines_added).green(),
                    format!("-{}", lines_deleted).red()
                );
            }
            DiffKind::Modified { .. } => {
                if let Some(text) = render_file(&report.version, file) {
                    print_unified(&text);
                }
            }
            DiffKind::Binary => println!("{}", format!("Binary file {} differs", file.path).yellow()),
            DiffKind::TooLarge => {
                println!("{}", format!("File {} differs (too large for a line diff)", file.path).yellow())
            }
            DiffKind::Added => println!("{}", format!("+ {} (New)", file.path).green()),
            DiffKind::Deleted => println!("{}", format!("- {} (Deleted)", file.path).red()),
        }
    }

    let (added, deleted) = report.line_totals();
    println!(
        "\n{} files differ, {} insertions(+), {} deletions(-)",
        report.files.len(),
        added.to_string().green(),
        deleted.to_string().red()
    );
    Ok(())
}

fn print_unified(text: &str) {
    for line in text.lines() {
        let colored_line = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{}", colored_line);
    }
    println!();
}

fn warn_if_corrupted(repo: &Repository) -> Result<()> {
    if let Some(warning) = repo.load_manifest()?.warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
    Ok(())
}

fn rounded(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
