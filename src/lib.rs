//! # casbak - Incremental deduplicating mirror backups
//!
//! casbak mirrors a source directory tree into a backup location while
//! storing file contents exactly once, keyed by a cryptographic digest, in a
//! content-addressable store (CAS). Re-running against an unchanged source
//! re-uses the stored objects instead of copying bytes again.
//!
//! ## Overview
//!
//! One run walks the source tree top-down and produces two things:
//!
//! - a **mirror**: a directory tree under the backup root whose structure
//!   matches the source exactly, with each file entry referencing its CAS
//!   object (hard link where possible) instead of duplicating bytes
//! - a **store**: hash-named objects under the data root, optionally sharded
//!   into levels of 2-hex-character prefix directories
//!
//! ```text
//! backup_root/              data_root/          shard_depth = 1
//! ├── a.txt  ──────────┐    ├── 2C/
//! └── sub/             ├──▶ │   └── F24DBA5FB0A30E...
//!     └── b.txt  ──────┘    └── ...
//! ```
//!
//! The durable state between runs is exactly the mirror structure plus the
//! store contents; nothing else is persisted. There is no pruning of stale
//! entries and no snapshot history: each run overwrites the mirror in place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use casbak::{BackupConfig, BackupEngine, HashAlgorithm};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = BackupConfig::new(
//!     PathBuf::from("./photos"),       // tree to back up
//!     PathBuf::from("/backup/photos"), // mirrored structure
//!     PathBuf::from("/backup/objects"),// content-addressable store
//!     HashAlgorithm::Sha256,
//! );
//! config.shard_depth = 1;
//! config.auto_create_dirs = true;
//!
//! let mut engine = BackupEngine::new(config)?;
//! let stats = engine.run()?;
//! println!("{} new, {} deduplicated", stats.files_new, stats.files_old);
//! # Ok(())
//! # }
//! ```
//!
//! ## Interactive gates
//!
//! The engine can wait for the operator before starting, before each
//! directory, and before each file, and asks before creating missing
//! backup/data roots. All of that goes through the [`ConfirmationGate`]
//! trait; [`StdinGate`] prompts on the console, [`AutoGate`] answers with a
//! fixed yes or no for unattended runs and tests.
//!
//! ## Error Handling
//!
//! Operations return `Result<T, CasbakError>`. Configuration problems and a
//! refused confirmation abort before any traversal; everything after that is
//! per-entry: logged through `tracing`, tolerated, and retried naturally by
//! the next incremental run. "Already exists" failures can be downgraded
//! with the ignore-existing policy.
//!
//! ## Module Organization
//!
//! - [`engine`]: run orchestration and statistics
//! - [`store`]: content-addressable object store with prefix sharding
//! - [`mirror`]: mirrored tree construction (directories and references)
//! - [`hasher`]: configurable streamed digests
//! - [`mapping`]: source → backup path projection
//! - [`gate`]: confirmation and pause gates
//! - [`types`]: configuration and statistics types
//! - [`error`]: error types and handling

pub mod engine;
pub mod error;
pub mod gate;
pub mod hasher;
pub mod mapping;
pub mod mirror;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use engine::BackupEngine;
pub use error::{CasbakError, Result};
pub use gate::{AutoGate, ConfirmationGate, StdinGate};
pub use hasher::{hash_file, HashAlgorithm};
pub use mapping::map_path;
pub use mirror::{DirOutcome, EntryOutcome, Mirror};
pub use store::{ContentStore, StoreOutcome};
pub use types::{format_bytes, BackupConfig, RunStats};
