//! Local-directory storage backend
//!
//! Serves the `file://` scheme by mapping object keys onto paths under a
//! root directory. Semantics mirror the OSS backend: single-object get/put,
//! prefix download replacing the destination, delete-then-reupload for
//! directory pushes, and a distinguished not-found condition.

use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::StorageBackend;
use crate::remote::RemoteRef;
use crate::{Error, Result};

pub struct FsBackend {
    root: PathBuf,
    namespace: String,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    fn check_ref(&self, reference: &RemoteRef) -> Result<()> {
        if reference.scheme() != "file" {
            return Err(Error::SchemeMismatch {
                expected: "file".to_string(),
                found: reference.scheme().to_string(),
            });
        }
        if reference.namespace() != self.namespace {
            return Err(Error::NamespaceMismatch {
                expected: self.namespace.clone(),
                found: reference.namespace().to_string(),
            });
        }
        if reference.key().is_empty() {
            return Err(Error::InvalidRef {
                reference: reference.to_string(),
                message: "object key is missing".to_string(),
            });
        }
        Ok(())
    }

    fn object_path(&self, reference: &RemoteRef) -> PathBuf {
        let mut path = self.root.clone();
        for segment in reference.key().split('/') {
            path.push(segment);
        }
        path
    }
}

impl StorageBackend for FsBackend {
    fn pull(&self, src: &RemoteRef, dst: &Path) -> Result<()> {
        self.check_ref(src)?;
        let object = self.object_path(src);
        tracing::debug!(src = %src, dst = %dst.display(), "fs backend pull");

        if object.is_file() {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::copy(&object, dst).map_err(|e| Error::io(&object, e))?;
            return Ok(());
        }
        if object.is_dir() {
            if dst.exists() {
                fs::remove_dir_all(dst).map_err(|e| Error::io(dst, e))?;
            }
            conf_fs::io::copy_dir_staged(&object, dst)?;
            return Ok(());
        }
        Err(Error::NotFound {
            reference: src.to_string(),
        })
    }

    fn push(&self, src: &Path, dst: &RemoteRef) -> Result<()> {
        self.check_ref(dst)?;
        let object = self.object_path(dst);
        tracing::debug!(src = %src.display(), dst = %dst, "fs backend push");

        let metadata = fs::metadata(src).map_err(|e| Error::io(src, e))?;
        if metadata.is_dir() {
            // Delete-then-replace, same as the remote provider.
            if object.exists() {
                fs::remove_dir_all(&object).map_err(|e| Error::io(&object, e))?;
            }
            conf_fs::io::copy_dir_staged(src, &object)?;
        } else {
            if let Some(parent) = object.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::copy(src, &object).map_err(|e| Error::io(src, e))?;
        }
        Ok(())
    }
}
