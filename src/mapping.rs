//! Projection of source paths into the mirrored backup tree
//!
//! Every directory and file the traversal visits is mapped from its location
//! under the source root to the corresponding location under the backup
//! root. The mapping is purely structural: it compares path segments, so the
//! result is independent of trailing separators and never touches the
//! filesystem.

use crate::error::{CasbakError, Result};
use std::path::{Path, PathBuf};

/// Map a path under `source_root` to its location under `dest_root`
///
/// Walks the leading path segments of `path` and `source_root` together to
/// find their longest common prefix. The prefix must cover all of
/// `source_root`; a shorter match means `path` lies outside the tree being
/// backed up, which is a [`CasbakError::PathOutsideRoot`]. The segments of
/// `path` past the prefix are joined onto `dest_root`, so `path ==
/// source_root` maps to `dest_root` itself.
///
/// The comparison runs segment by segment and never assumes `path` is a
/// strict child of `source_root`; traversal should not hand us an outside
/// path, but the mapping verifies it rather than trusting the caller.
pub fn map_path(path: &Path, source_root: &Path, dest_root: &Path) -> Result<PathBuf> {
    let mut remainder = path.components();

    for root_segment in source_root.components() {
        match remainder.clone().next() {
            Some(segment) if segment == root_segment => {
                remainder.next();
            }
            _ => {
                return Err(CasbakError::PathOutsideRoot {
                    path: path.to_path_buf(),
                    root: source_root.to_path_buf(),
                });
            }
        }
    }

    let rest = remainder.as_path();
    if rest.as_os_str().is_empty() {
        Ok(dest_root.to_path_buf())
    } else {
        Ok(dest_root.join(rest))
    }
}
