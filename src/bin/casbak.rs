//! # casbak CLI - deduplicating mirror backups
//!
//! Thin wrapper around the casbak engine: flag parsing, logging setup, and
//! summary formatting. All backup logic lives in the library.
//!
//! ## Usage
//! ```bash
//! # Mirror a tree, sharding the store one level deep
//! casbak --source-root ~/photos --backup-root /backup/photos \
//!        --data-root /backup/objects --shard-depth 1 --hash sha256 --stats
//!
//! # Unattended run that creates missing roots and tolerates re-runs
//! casbak --source-root /srv/www --backup-root /backup/www \
//!        --data-root /backup/objects --hash sha512 \
//!        --create-dirs --ignore-existing
//! ```

use casbak::{format_bytes, BackupConfig, BackupEngine, HashAlgorithm, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::*;
use humantime::format_duration;
use std::path::PathBuf;
use std::time::Instant;

/// casbak - mirror a directory tree while storing file contents once
#[derive(Parser)]
#[command(name = "casbak")]
#[command(author = "Mufeed VH <mufeed@asterisk.so>")]
#[command(version)]
#[command(about = "Incremental deduplicating backups over a content-addressable store")]
#[command(long_about = None)]
struct Cli {
    /// Directory tree to back up
    #[arg(long, value_name = "DIR")]
    source_root: PathBuf,

    /// Directory receiving the mirrored tree
    #[arg(long, value_name = "DIR")]
    backup_root: PathBuf,

    /// Directory holding the hash-named content objects
    #[arg(long, value_name = "DIR")]
    data_root: PathBuf,

    /// Digest algorithm keying the content store
    #[arg(long, value_enum)]
    hash: HashMode,

    /// Subdirectory levels used to shard the data root
    #[arg(long, default_value_t = 0, value_name = "N")]
    shard_depth: usize,

    /// Create missing backup/data roots without asking
    #[arg(long)]
    create_dirs: bool,

    /// Pause at the gate after an error is logged
    #[arg(long)]
    pause_on_error: bool,

    /// Wait for [ENTER] before any work begins
    #[arg(long)]
    wait_before_start: bool,

    /// Wait for [ENTER] before each directory
    #[arg(long)]
    pause_before_dirs: bool,

    /// Wait for [ENTER] before each file
    #[arg(long)]
    pause_before_files: bool,

    /// Display statistics when the run completes
    #[arg(long)]
    stats: bool,

    /// Display interim statistics every N files (0 disables)
    #[arg(long, default_value_t = 0, value_name = "N")]
    progress_every: usize,

    /// Ignore errors stating a file or directory already exists
    #[arg(long)]
    ignore_existing: bool,

    /// Verbosity; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// CLI-facing names for the supported digest algorithms
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum HashMode {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha512,
}

impl From<HashMode> for HashAlgorithm {
    fn from(mode: HashMode) -> Self {
        match mode {
            HashMode::Md5 => HashAlgorithm::Md5,
            HashMode::Sha1 => HashAlgorithm::Sha1,
            HashMode::Sha224 => HashAlgorithm::Sha224,
            HashMode::Sha256 => HashAlgorithm::Sha256,
            HashMode::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; verbosity widens the level one step at a time
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Build the configuration, run the engine, and print the summary
fn run(cli: Cli) -> Result<()> {
    let mut config = BackupConfig::new(
        cli.source_root,
        cli.backup_root,
        cli.data_root,
        cli.hash.into(),
    );
    config.shard_depth = cli.shard_depth;
    config.auto_create_dirs = cli.create_dirs;
    config.pause_on_error = cli.pause_on_error;
    config.await_start_confirmation = cli.wait_before_start;
    config.pause_before_directories = cli.pause_before_dirs;
    config.pause_before_files = cli.pause_before_files;
    config.emit_final_stats = cli.stats;
    config.progress_every_n = cli.progress_every;
    config.ignore_already_exists = cli.ignore_existing;
    config.verbosity = cli.verbose;

    let show_stats = cli.stats;

    let mut engine = BackupEngine::new(config)?;
    let start = Instant::now();
    let stats = engine.run()?;
    let elapsed = start.elapsed();

    println!("{} Backup complete", "✓".green().bold());
    if show_stats {
        println!(
            "  Directories: {}",
            stats.directories_total.to_string().cyan()
        );
        println!(
            "  Files: {} ({} new, {} already stored)",
            stats.files_total.to_string().cyan(),
            stats.files_new.to_string().green(),
            stats.files_old.to_string().yellow()
        );
        println!("  Stored: {}", format_bytes(stats.bytes_stored).cyan());
    }
    println!("  Time: {}", format_duration(elapsed).to_string().cyan());

    Ok(())
}
