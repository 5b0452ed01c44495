//! Content-addressable object store
//!
//! File contents are stored once, named by their digest, under the data
//! root. The store can be sharded: the first `shard_depth` pairs of hex
//! characters each become one directory level, keeping any single directory
//! from growing unbounded as objects accumulate.
//!
//! ```text
//! data_root/                     shard_depth = 2
//! ├── 2C/
//! │   └── F2/
//! │       └── 4DBA5FB0A30E...    # remaining digest characters
//! └── E3/
//!     └── B0/
//!         └── C44298FC1C14...
//! ```
//!
//! An object's location is a pure function of the data root, the digest, and
//! the shard depth; two runs computing the same digest always resolve the
//! identical path. Existing objects are trusted by digest and never re-read.

use crate::error::{CasbakError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Outcome of placing content into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The object was copied into the store by this call
    Stored,
    /// An object with this digest was already present
    AlreadyPresent,
}

/// Content-addressable storage keyed by digest
#[derive(Debug, Clone)]
pub struct ContentStore {
    /// Root directory holding the hash-named objects
    data_root: PathBuf,
    /// Number of 2-character prefix levels
    shard_depth: usize,
    /// Treat "already exists" write failures as deduplication hits
    ignore_existing: bool,
}

impl ContentStore {
    /// Create a store over `data_root`
    ///
    /// The caller is responsible for validating `shard_depth` against the
    /// digest length; the store assumes every digest it receives leaves a
    /// non-empty file name after sharding.
    pub fn new(data_root: impl Into<PathBuf>, shard_depth: usize, ignore_existing: bool) -> Self {
        Self {
            data_root: data_root.into(),
            shard_depth,
            ignore_existing,
        }
    }

    /// Resolve the storage path for a digest
    ///
    /// Splits `shard_depth` leading 2-character groups off the digest, each
    /// becoming one directory level, with the remaining characters as the
    /// file name. Depth 0 stores the object directly under the data root
    /// named by the full digest.
    pub fn locate(&self, digest: &str) -> PathBuf {
        let mut path = self.data_root.clone();
        let mut rest = digest;

        for _ in 0..self.shard_depth {
            let (prefix, suffix) = rest.split_at(2);
            path.push(prefix);
            rest = suffix;
        }

        path.push(rest);
        path
    }

    /// Store the content of `source` under `digest` unless already present
    ///
    /// Missing shard directories are created idempotently before the
    /// existence check. An existing object is assumed identical to the
    /// incoming content (digests are collision-resistant) and its bytes are
    /// not compared.
    pub fn ensure_stored(&self, digest: &str, source: &Path) -> Result<StoreOutcome> {
        let target = self.locate(digest);

        if self.shard_depth > 0 {
            if let Some(shard_dir) = target.parent() {
                fs::create_dir_all(shard_dir).map_err(|e| CasbakError::StoreWrite {
                    path: shard_dir.to_path_buf(),
                    source: e,
                })?;
            }
        }

        if target.exists() {
            trace!("object {} already present", digest);
            return Ok(StoreOutcome::AlreadyPresent);
        }

        match fs::copy(source, &target) {
            Ok(bytes) => {
                trace!("stored object {} ({} bytes)", digest, bytes);
                Ok(StoreOutcome::Stored)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && self.ignore_existing => {
                trace!("object {} appeared while storing, treating as present", digest);
                Ok(StoreOutcome::AlreadyPresent)
            }
            Err(e) => Err(CasbakError::StoreWrite {
                path: target,
                source: e,
            }),
        }
    }

    /// Root directory of the store
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }
}
