//! Run orchestration: one traversal pass over the source tree
//!
//! The engine validates the three roots, optionally waits at the start gate,
//! then walks the source tree depth-first in pre-order. Each directory is
//! mirrored through [`Mirror`], each file flows through hash → store →
//! mirror, and statistics accumulate along the way. Per-entry failures are
//! logged and tolerated; the failed entry simply remains for the next
//! incremental run to pick up. Only a configuration problem or a refused
//! confirmation aborts the run.
//!
//! Everything is synchronous and strictly sequential: one directory, one
//! file at a time. Each file handle is scoped to its own traversal step and
//! closed before the engine advances.

use crate::error::{CasbakError, Result};
use crate::gate::{ConfirmationGate, StdinGate};
use crate::hasher::hash_file;
use crate::mapping::map_path;
use crate::mirror::Mirror;
use crate::store::{ContentStore, StoreOutcome};
use crate::types::{BackupConfig, RunStats};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, trace};
use walkdir::WalkDir;

/// Orchestrates one incremental backup pass
///
/// # Example
///
/// ```rust,no_run
/// use casbak::{AutoGate, BackupConfig, BackupEngine, HashAlgorithm};
///
/// # fn main() -> casbak::Result<()> {
/// let mut config = BackupConfig::new("./photos", "/backup/photos", "/backup/objects",
///     HashAlgorithm::Sha256);
/// config.shard_depth = 1;
/// config.auto_create_dirs = true;
///
/// let mut engine = BackupEngine::with_gate(config, Box::new(AutoGate::accept()))?;
/// let stats = engine.run()?;
/// println!("{} objects stored", stats.files_new);
/// # Ok(())
/// # }
/// ```
pub struct BackupEngine {
    config: BackupConfig,
    store: ContentStore,
    mirror: Mirror,
    gate: Box<dyn ConfirmationGate>,
}

impl std::fmt::Debug for BackupEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("mirror", &self.mirror)
            .field("gate", &"<dyn ConfirmationGate>")
            .finish()
    }
}

impl BackupEngine {
    /// Create an engine that prompts on the console
    pub fn new(config: BackupConfig) -> Result<Self> {
        Self::with_gate(config, Box::new(StdinGate))
    }

    /// Create an engine with an injected gate
    ///
    /// Fails with [`CasbakError::InvalidConfiguration`] if the shard depth
    /// would consume the configured algorithm's whole digest.
    pub fn with_gate(config: BackupConfig, gate: Box<dyn ConfirmationGate>) -> Result<Self> {
        config.validate()?;

        let store = ContentStore::new(
            &config.data_root,
            config.shard_depth,
            config.ignore_already_exists,
        );
        let mirror = Mirror::new(config.ignore_already_exists);

        Ok(Self {
            config,
            store,
            mirror,
            gate,
        })
    }

    /// Run one backup pass and return the accumulated statistics
    ///
    /// Phases run strictly in order: input validation (fatal on a missing
    /// source root or a refused root creation), the optional start gate, the
    /// traversal itself, and the final report.
    pub fn run(&mut self) -> Result<RunStats> {
        debug!("checking inputs");
        self.validate_roots()?;
        debug!("effective configuration: {:?}", self.config);

        if self.config.await_start_confirmation {
            self.gate.pause("Waiting before starting the backup.");
        }

        info!("backing up {:?}", self.config.source_root);
        let mut stats = RunStats::default();
        self.traverse(&mut stats);

        if self.config.emit_final_stats {
            info!("{}", stats.summary());
        }

        Ok(stats)
    }

    /// Check the three roots, creating backup/data roots on confirmation
    ///
    /// The source root is never created: backing up a tree that does not
    /// exist is a configuration error.
    fn validate_roots(&self) -> Result<()> {
        if !self.config.source_root.exists() {
            return Err(CasbakError::invalid_config(format!(
                "source root {:?} does not exist",
                self.config.source_root
            )));
        }
        trace!("source root {:?} exists", self.config.source_root);

        self.ensure_root(&self.config.backup_root, "backup root")?;
        self.ensure_root(&self.config.data_root, "data root")?;

        Ok(())
    }

    fn ensure_root(&self, root: &Path, label: &str) -> Result<()> {
        if root.exists() {
            trace!("{} {:?} exists", label, root);
            return Ok(());
        }
        debug!("{} {:?} does not exist", label, root);

        if !self.config.auto_create_dirs {
            let prompt = format!("The {} {} does not exist. Create?", label, root.display());
            if !self.gate.confirm(&prompt) {
                return Err(CasbakError::aborted(format!(
                    "{} {:?} does not exist",
                    label, root
                )));
            }
        }

        fs::create_dir_all(root)?;
        debug!("created {} {:?}", label, root);
        Ok(())
    }

    /// Depth-first pre-order walk dispatching each entry
    ///
    /// Pre-order guarantees a directory is mirrored before any of its
    /// children are visited, which is what lets directory creation stay
    /// non-recursive. Unreadable entries are tolerated like any other
    /// per-entry failure.
    fn traverse(&mut self, stats: &mut RunStats) {
        let walker = WalkDir::new(&self.config.source_root).follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.report_entry_failure(&CasbakError::Walk(e));
                    continue;
                }
            };

            // The source root itself maps onto the already-validated backup
            // root and is never re-created.
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.process_directory(entry.path(), stats);
            } else if file_type.is_file() {
                self.process_file(entry.path(), stats);
            } else {
                debug!("skipping non-regular entry {:?}", entry.path());
            }
        }
    }

    /// Mirror one directory
    fn process_directory(&mut self, path: &Path, stats: &mut RunStats) {
        if self.config.pause_before_directories {
            self.gate
                .pause("Waiting before mirroring the next directory.");
        }

        if tracing::enabled!(tracing::Level::TRACE) {
            self.announce_directory(path);
        } else {
            debug!("directory {:?}", path);
        }

        let dest = match map_path(path, &self.config.source_root, &self.config.backup_root) {
            Ok(dest) => dest,
            Err(e) => {
                self.report_entry_failure(&e);
                return;
            }
        };
        trace!("mirroring {:?} -> {:?}", path, dest);

        match self.mirror.ensure_directory(&dest) {
            Ok(_) => stats.directories_total += 1,
            Err(e) => self.report_entry_failure(&e),
        }
    }

    /// Announce a directory together with its immediate child counts
    fn announce_directory(&self, path: &Path) {
        let (mut files, mut dirs) = (0usize, 0usize);
        if let Ok(entries) = fs::read_dir(path) {
            for child in entries.flatten() {
                match child.file_type() {
                    Ok(t) if t.is_dir() => dirs += 1,
                    Ok(t) if t.is_file() => files += 1,
                    _ => {}
                }
            }
        }
        trace!("directory {:?} (files: {}, subdirs: {})", path, files, dirs);
    }

    /// Back up one file, counting it whether or not it succeeds
    fn process_file(&mut self, path: &Path, stats: &mut RunStats) {
        if self.config.pause_before_files {
            self.gate.pause("Waiting before backing up the next file.");
        }

        stats.files_total += 1;
        debug!("file {:?}", path);

        if let Err(e) = self.back_up_file(path, stats) {
            self.report_entry_failure(&e);
        }

        if self.config.progress_every_n > 0 && stats.files_total % self.config.progress_every_n == 0
        {
            info!("progress: {}", stats.summary());
        }
    }

    /// Hash one file, place its content in the store, and reference it from
    /// the mirror
    ///
    /// The store outcome decides the new/old counter before the mirror entry
    /// is placed, so a failed reference still leaves the object stored and
    /// counted; the reference is retried on the next run.
    fn back_up_file(&mut self, path: &Path, stats: &mut RunStats) -> Result<()> {
        let digest = hash_file(path, self.config.hash_algorithm)?;
        trace!("hashed {:?} -> {}", path, digest);

        let dest = map_path(path, &self.config.source_root, &self.config.backup_root)?;
        let object = self.store.locate(&digest);
        trace!("object path {:?}, mirror path {:?}", object, dest);

        match self.store.ensure_stored(&digest, path)? {
            StoreOutcome::Stored => {
                stats.files_new += 1;
                stats.bytes_stored += fs::metadata(&object).map(|m| m.len()).unwrap_or(0);
            }
            StoreOutcome::AlreadyPresent => stats.files_old += 1,
        }

        self.mirror.ensure_file_entry(&dest, &object)?;
        Ok(())
    }

    /// Log a per-entry failure and apply the error policies
    ///
    /// Tolerated "already exists" conditions drop to debug level when the
    /// ignore-existing policy is set; everything else is reported. Nothing
    /// here stops the traversal.
    fn report_entry_failure(&self, err: &CasbakError) {
        if err.is_already_exists() && self.config.ignore_already_exists {
            debug!("ignored: {}", err);
            return;
        }

        error!("{}", err);

        if self.config.pause_on_error {
            self.gate.pause("An error occurred.");
        }
    }
}
