//! Core data types shared across the casbak library
//!
//! The types in this module represent:
//! - **Configuration**: [`BackupConfig`] - the immutable parameters of one run
//! - **Results**: [`RunStats`] - counters accumulated over one run

use crate::error::{CasbakError, Result};
use crate::hasher::HashAlgorithm;
use std::path::PathBuf;

/// Configuration for one backup run
///
/// Supplied once at startup and immutable for the duration of the run. The
/// three roots and the digest algorithm are required; everything else is a
/// policy flag that defaults to off.
///
/// # Examples
///
/// ```rust
/// use casbak::{BackupConfig, HashAlgorithm};
/// use std::path::PathBuf;
///
/// let mut config = BackupConfig::new(
///     PathBuf::from("./photos"),
///     PathBuf::from("/backup/photos"),
///     PathBuf::from("/backup/objects"),
///     HashAlgorithm::Sha256,
/// );
/// config.shard_depth = 1;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Directory tree to back up
    pub source_root: PathBuf,
    /// Directory receiving the mirrored tree structure
    pub backup_root: PathBuf,
    /// Directory holding the hash-named content objects
    pub data_root: PathBuf,
    /// Number of 2-hex-character prefix levels used to shard the data root
    pub shard_depth: usize,
    /// Create missing backup/data roots without prompting
    pub auto_create_dirs: bool,
    /// Invoke the gate's pause after a per-entry failure is logged
    pub pause_on_error: bool,
    /// Wait at the gate before any work begins
    pub await_start_confirmation: bool,
    /// Wait at the gate before each directory is mirrored
    pub pause_before_directories: bool,
    /// Wait at the gate before each file is processed
    pub pause_before_files: bool,
    /// Log the statistics snapshot when the run completes
    pub emit_final_stats: bool,
    /// Log an interim statistics snapshot every N files (0 disables)
    pub progress_every_n: usize,
    /// Tolerate "already exists" failures from the store and mirror
    pub ignore_already_exists: bool,
    /// Digest algorithm keying the content store
    pub hash_algorithm: HashAlgorithm,
    /// Console verbosity requested by the wrapper (0-3+)
    pub verbosity: u8,
}

impl BackupConfig {
    /// Minimal configuration with all policy flags off
    pub fn new(
        source_root: impl Into<PathBuf>,
        backup_root: impl Into<PathBuf>,
        data_root: impl Into<PathBuf>,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            backup_root: backup_root.into(),
            data_root: data_root.into(),
            shard_depth: 0,
            auto_create_dirs: false,
            pause_on_error: false,
            await_start_confirmation: false,
            pause_before_directories: false,
            pause_before_files: false,
            emit_final_stats: false,
            progress_every_n: 0,
            ignore_already_exists: false,
            hash_algorithm,
            verbosity: 0,
        }
    }

    /// Check invariants that need no filesystem access
    ///
    /// The shard depth must leave a non-empty file name after the
    /// 2-character prefixes are split off the digest.
    pub fn validate(&self) -> Result<()> {
        if self.shard_depth * 2 >= self.hash_algorithm.hex_len() {
            return Err(CasbakError::invalid_config(format!(
                "shard depth {} consumes the whole {}-character {} digest",
                self.shard_depth,
                self.hash_algorithm.hex_len(),
                self.hash_algorithm,
            )));
        }
        Ok(())
    }
}

/// Counters accumulated over one backup run
///
/// Created at run start, mutated only by the engine, and returned when the
/// run completes. Nothing here persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Directories mirrored (the source root itself is not counted)
    pub directories_total: usize,
    /// Regular files encountered, whether or not they were backed up
    pub files_total: usize,
    /// Files whose content entered the store during this run
    pub files_new: usize,
    /// Files whose content was already present in the store
    pub files_old: usize,
    /// Bytes of new content copied into the store during this run
    pub bytes_stored: u64,
}

impl RunStats {
    /// One-line snapshot used for progress and final reporting
    pub fn summary(&self) -> String {
        format!(
            "dirs: {} | files: {} ({} new, {} old) | stored: {}",
            self.directories_total,
            self.files_total,
            self.files_new,
            self.files_old,
            format_bytes(self.bytes_stored),
        )
    }
}

/// Format bytes in human-readable form
///
/// Uses binary units (1024-based). Values below 1 KB are shown as whole
/// numbers; larger values get two decimal places.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
