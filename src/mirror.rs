//! Construction of the mirrored backup tree
//!
//! The mirror reproduces the source tree's directory names exactly, but its
//! file entries reference content-store objects instead of duplicating their
//! bytes. References are hard links where the filesystem allows them, with a
//! byte copy as the fallback (for example when the backup root and the data
//! root live on different filesystems).

use crate::error::{CasbakError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, trace};

/// Outcome of ensuring a mirrored directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOutcome {
    /// The directory was created by this call
    Created,
    /// The directory was already mirrored (ignore-existing policy)
    AlreadyExists,
}

/// Outcome of placing a mirror file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A hard link to the store object was created
    Linked,
    /// The object's bytes were copied (linking unavailable)
    Copied,
}

/// Builds the mirrored directory tree entry by entry
#[derive(Debug, Clone, Copy)]
pub struct Mirror {
    /// Treat "already exists" failures as satisfied outcomes
    ignore_existing: bool,
}

impl Mirror {
    pub fn new(ignore_existing: bool) -> Self {
        Self { ignore_existing }
    }

    /// Create one mirrored directory
    ///
    /// Non-recursive: traversal order guarantees the parent directory was
    /// mirrored before its children are visited. A directory that already
    /// exists is an error unless the ignore-existing policy is enabled.
    pub fn ensure_directory(&self, dest: &Path) -> Result<DirOutcome> {
        match fs::create_dir(dest) {
            Ok(()) => {
                trace!("created directory {:?}", dest);
                Ok(DirOutcome::Created)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && self.ignore_existing => {
                trace!("directory {:?} already mirrored", dest);
                Ok(DirOutcome::AlreadyExists)
            }
            Err(e) => Err(CasbakError::CreateDir {
                path: dest.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Expose a stored object at its mirrored path
    ///
    /// The entry is produced whether the object was stored by this run or
    /// was already present. Any previous entry at `dest` is replaced, since
    /// each run overwrites the mirror in place. Hard linking keeps the
    /// mirror free of duplicate bytes; when the link fails the object is
    /// copied instead.
    pub fn ensure_file_entry(&self, dest: &Path, object: &Path) -> Result<EntryOutcome> {
        if dest.exists() {
            fs::remove_file(dest).map_err(|e| CasbakError::MirrorEntry {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }

        match fs::hard_link(object, dest) {
            Ok(()) => {
                trace!("linked {:?} -> {:?}", dest, object);
                Ok(EntryOutcome::Linked)
            }
            Err(link_err) => {
                debug!(
                    "hard link {:?} -> {:?} failed ({}), copying instead",
                    dest, object, link_err
                );
                match fs::copy(object, dest) {
                    Ok(_) => Ok(EntryOutcome::Copied),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists && self.ignore_existing => {
                        Ok(EntryOutcome::Copied)
                    }
                    Err(e) => Err(CasbakError::MirrorEntry {
                        path: dest.to_path_buf(),
                        source: e,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directory_creates() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("sub");

        let mirror = Mirror::new(false);
        assert_eq!(mirror.ensure_directory(&dest).unwrap(), DirOutcome::Created);
        assert!(dest.is_dir());
    }

    #[test]
    fn test_existing_directory_needs_policy() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("sub");
        fs::create_dir(&dest).unwrap();

        let strict = Mirror::new(false);
        let err = strict.ensure_directory(&dest).unwrap_err();
        assert!(matches!(err, CasbakError::CreateDir { .. }));
        assert!(err.is_already_exists());

        let tolerant = Mirror::new(true);
        assert_eq!(
            tolerant.ensure_directory(&dest).unwrap(),
            DirOutcome::AlreadyExists
        );
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        // Directory creation is non-recursive; an unmirrored parent surfaces
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("missing").join("sub");

        let mirror = Mirror::new(false);
        let err = mirror.ensure_directory(&dest).unwrap_err();
        assert!(matches!(err, CasbakError::CreateDir { .. }));
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_file_entry_references_object() {
        let temp_dir = TempDir::new().unwrap();
        let object = temp_dir.path().join("object");
        fs::write(&object, b"hello").unwrap();
        let dest = temp_dir.path().join("a.txt");

        let mirror = Mirror::new(false);
        let outcome = mirror.ensure_file_entry(&dest, &object).unwrap();
        // Same filesystem, so the hard link path is taken
        assert_eq!(outcome, EntryOutcome::Linked);
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_file_entry_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let object = temp_dir.path().join("object");
        fs::write(&object, b"new content").unwrap();
        let dest = temp_dir.path().join("a.txt");
        fs::write(&dest, b"stale").unwrap();

        let mirror = Mirror::new(false);
        mirror.ensure_file_entry(&dest, &object).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new content");
    }

    #[test]
    fn test_missing_object_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let object = temp_dir.path().join("missing-object");
        let dest = temp_dir.path().join("a.txt");

        let mirror = Mirror::new(false);
        let err = mirror.ensure_file_entry(&dest, &object).unwrap_err();
        assert!(matches!(err, CasbakError::MirrorEntry { .. }));
    }
}
