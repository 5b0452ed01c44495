//! Error types for the casbak library
//!
//! Errors fall into two tiers. Configuration problems and a refused
//! confirmation are fatal and stop the run before any traversal. Everything
//! else is a per-entry failure: the engine logs it and moves on to the next
//! entry, leaving the failed entry to be retried by the next invocation.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the casbak library
pub type Result<T> = std::result::Result<T, CasbakError>;

/// Main error type for all casbak operations
#[derive(Debug, Error)]
pub enum CasbakError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or incomplete configuration (fatal, pre-traversal)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The user declined a confirmation prompt (fatal, pre-traversal)
    #[error("Aborted: {0}")]
    Aborted(String),

    /// A path did not lie under the source root during mapping
    #[error("Path {path:?} is not under source root {root:?}")]
    PathOutsideRoot {
        /// Path that failed to map
        path: PathBuf,
        /// Source root it was expected to lie under
        root: PathBuf,
    },

    /// Hashing a file failed; the file is skipped for this run
    #[error("Failed to hash {path:?}: {source}")]
    Hash {
        /// File that could not be hashed
        path: PathBuf,
        /// Underlying open or read failure
        #[source]
        source: std::io::Error,
    },

    /// Creating a mirrored directory failed
    #[error("Failed to create directory {path:?}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an object into the content store failed
    #[error("Failed to store object at {path:?}: {source}")]
    StoreWrite {
        /// Object path that could not be written
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Placing a mirror reference to a stored object failed
    #[error("Failed to place mirror entry {path:?}: {source}")]
    MirrorEntry {
        /// Mirror path that could not be placed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CasbakError {
    /// Create a configuration error with a custom message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        CasbakError::InvalidConfiguration(msg.into())
    }

    /// Create an abort error with a custom message
    pub fn aborted(msg: impl Into<String>) -> Self {
        CasbakError::Aborted(msg.into())
    }

    /// Check whether the underlying cause is an "already exists" condition
    ///
    /// This is the sub-condition the engine swallows when the
    /// ignore-existing policy is enabled.
    pub fn is_already_exists(&self) -> bool {
        match self {
            CasbakError::Io(source) => source.kind() == ErrorKind::AlreadyExists,
            CasbakError::CreateDir { source, .. }
            | CasbakError::StoreWrite { source, .. }
            | CasbakError::MirrorEntry { source, .. } => {
                source.kind() == ErrorKind::AlreadyExists
            }
            _ => false,
        }
    }

    /// Check whether this error aborts the run rather than a single entry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CasbakError::InvalidConfiguration(_) | CasbakError::Aborted(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CasbakError::invalid_config("shard depth too deep");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: shard depth too deep"
        );
    }

    #[test]
    fn test_error_fatal() {
        assert!(CasbakError::aborted("declined").is_fatal());
        assert!(CasbakError::invalid_config("missing root").is_fatal());
        assert!(!CasbakError::Hash {
            path: PathBuf::from("/src/a.txt"),
            source: std::io::Error::new(ErrorKind::NotFound, "gone"),
        }
        .is_fatal());
    }

    #[test]
    fn test_already_exists_condition() {
        let exists = CasbakError::CreateDir {
            path: PathBuf::from("/backup/sub"),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "exists"),
        };
        assert!(exists.is_already_exists());

        let denied = CasbakError::CreateDir {
            path: PathBuf::from("/backup/sub"),
            source: std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!denied.is_already_exists());

        assert!(!CasbakError::aborted("declined").is_already_exists());
    }
}
