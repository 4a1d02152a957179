//! Directory content snapshots
//!
//! A snapshot is the sorted list of `(path, size, sha256)` records for every
//! regular file under a root. Sorting makes snapshot equality independent of
//! traversal order, which is what lets the sync protocol compare a local
//! tree against a recorded manifest entry.

use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::checksum;
use crate::{Error, Result};

/// One regular file inside a snapshot.
///
/// `path` is relative to the snapshot root and always slash-separated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

/// Snapshot a directory tree into sorted file records.
///
/// A missing root yields an empty snapshot; an entry that is neither a
/// regular file nor a directory is a fatal error.
///
/// # Errors
///
/// Returns an error on traversal failures, unreadable files, or non-regular
/// entries (symlinks, devices, sockets).
pub fn snapshot_dir(root: &Path) -> Result<Vec<FileRecord>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(io) => Error::Io { path, source: io },
                None => Error::NonRegularFile { path },
            }
        })?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            return Err(Error::NonRegularFile {
                path: entry.path().to_path_buf(),
            });
        }

        let metadata = entry
            .metadata()
            .map_err(|e| match e.into_io_error() {
                Some(io) => Error::Io {
                    path: entry.path().to_path_buf(),
                    source: io,
                },
                None => Error::NonRegularFile {
                    path: entry.path().to_path_buf(),
                },
            })?;
        // Walked paths are always under the walk root.
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };

        files.push(FileRecord {
            path: crate::path::to_slash(rel),
            size: metadata.len(),
            sha256: checksum::file_sha256(entry.path())?,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), files = files.len(), "snapshot built");
    Ok(files)
}

/// Compare two record lists as sets of `(path, size, sha256)`.
pub fn records_equal(a: &[FileRecord], b: &[FileRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut aa: Vec<&FileRecord> = a.iter().collect();
    let mut bb: Vec<&FileRecord> = b.iter().collect();
    aa.sort_by(|x, y| x.path.cmp(&y.path));
    bb.sort_by(|x, y| x.path.cmp(&y.path));
    aa.iter().zip(bb.iter()).all(|(x, y)| x == y)
}

/// Hash the canonical JSON serialization of a record list.
///
/// This is the `manifest_sha256` value recorded per manifest entry and used
/// for exact-equality short-circuiting.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn records_sha256(files: &[FileRecord]) -> Result<String> {
    let content = serde_json::to_vec(files).map_err(|e| Error::RecordSerialize {
        message: e.to_string(),
    })?;
    Ok(checksum::content_sha256(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            size: 1,
            sha256: "aa".to_string(),
        }
    }

    #[test]
    fn records_equal_ignores_order() {
        let a = vec![record("a"), record("b")];
        let b = vec![record("b"), record("a")];
        assert!(records_equal(&a, &b));
    }

    #[test]
    fn records_equal_detects_length_difference() {
        let a = vec![record("a")];
        let b = vec![record("a"), record("b")];
        assert!(!records_equal(&a, &b));
    }

    #[test]
    fn records_sha256_depends_on_content() {
        let a = records_sha256(&[record("a")]).unwrap();
        let b = records_sha256(&[record("b")]).unwrap();
        assert_ne!(a, b);
    }
}
