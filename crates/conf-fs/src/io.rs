//! Staged I/O operations
//!
//! Every destructive write here goes through a sibling temporary path and is
//! committed with a rename, so readers observe either the old state or the
//! new state, never a partial one.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename with an advisory lock on the temp file.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the temp file
/// cannot be written, or the final rename fails.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file in the same directory ensures the rename stays on one filesystem.
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Replace `target` with the already-staged directory at `staged`.
///
/// Any existing target is first renamed to `<target>.bak`; if moving the
/// staged directory into place fails, the backup is restored so the target
/// path is never left missing. The backup is removed on success.
///
/// # Errors
///
/// Returns an error if any rename fails; the rollback itself is best-effort.
pub fn replace_dir(target: &Path, staged: &Path) -> Result<()> {
    let backup = backup_path(target);
    let _ = fs::remove_dir_all(&backup);

    match fs::symlink_metadata(target) {
        Ok(_) => {
            fs::rename(target, &backup).map_err(|e| Error::io(target, e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(target, e)),
    }

    if let Err(e) = fs::rename(staged, target) {
        if backup.exists() {
            let _ = fs::rename(&backup, target);
        }
        return Err(Error::io(target, e));
    }
    let _ = fs::remove_dir_all(&backup);
    Ok(())
}

/// Copy `src` into `dst` via a staged `<dst>.tmp` directory.
///
/// The destination only appears once the copy has fully succeeded; a failed
/// copy removes the staging directory and leaves `dst` absent.
///
/// # Errors
///
/// Returns an error on traversal failures, non-regular source entries, or
/// copy/rename failures.
pub fn copy_dir_staged(src: &Path, dst: &Path) -> Result<()> {
    let staging = staging_path(dst);
    let _ = fs::remove_dir_all(&staging);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::create_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;

    if let Err(e) = copy_tree(src, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, dst) {
        let _ = fs::remove_dir_all(&staging);
        return Err(Error::io(dst, e));
    }
    Ok(())
}

/// The staging sibling used for directory-level operations on `path`.
pub fn staging_path(path: &Path) -> std::path::PathBuf {
    sibling_with_suffix(path, ".tmp")
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    sibling_with_suffix(path, ".bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}{suffix}"))
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            match e.into_io_error() {
                Some(io) => Error::Io { path, source: io },
                None => Error::NonRegularFile { path },
            }
        })?;
        // Walked paths are always under the walk root.
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| Error::io(entry.path(), e))?;
        } else {
            return Err(Error::NonRegularFile {
                path: entry.path().to_path_buf(),
            });
        }
    }
    Ok(())
}
