//! The revision ledger
//!
//! Two manifest copies exist per deployment: one next to the remote data and
//! one next to the local data. They are reconciled by the coordinator, never
//! merged. The remote copy is the only authoritative record of what revision
//! exists remotely; the local copy records what this machine last
//! synchronized to. Absence of an entry is equivalent to revision 0 with an
//! empty file list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use conf_fs::{FileRecord, records_sha256};
use conf_store::{RemoteRef, StorageBackend};

use crate::{Error, Result};

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_ALGORITHM: &str = "sha256";

fn default_manifest_version() -> u32 {
    MANIFEST_VERSION
}

fn default_manifest_algorithm() -> String {
    MANIFEST_ALGORITHM.to_string()
}

/// Versioned ledger mapping config names to their synchronization state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_manifest_version")]
    pub version: u32,
    #[serde(default = "default_manifest_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            algorithm: MANIFEST_ALGORITHM.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Per-entry synchronization state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Informational local path at the time of the recording push
    pub root: String,
    /// Monotonically increasing content generation, the sole ordering signal
    pub revision: u64,
    pub updated_at: String,
    pub updated_by: String,
    /// Sorted by path
    pub files: Vec<FileRecord>,
    /// Hash of the canonical JSON of `files`
    pub manifest_sha256: String,
}

impl ManifestEntry {
    /// Build a new entry stamped with the current time and actor identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the file-list hash cannot be computed.
    pub fn build(root: &Path, revision: u64, files: Vec<FileRecord>) -> Result<Self> {
        let manifest_sha256 = records_sha256(&files)?;
        Ok(Self {
            root: root.display().to_string(),
            revision,
            updated_at: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            updated_by: actor_identity(),
            files,
            manifest_sha256,
        })
    }
}

impl Manifest {
    /// Load a manifest from a local file.
    ///
    /// A missing or empty file yields the default manifest; malformed
    /// content is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error on unreadable or unparseable content.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|e| Error::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save the manifest to a local file via atomic replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_vec_pretty(self).map_err(|e| Error::ManifestSerialize {
                message: e.to_string(),
            })?;
        conf_fs::io::write_atomic(path, &content)?;
        Ok(())
    }

    /// Load the remote manifest through the backend.
    ///
    /// A "not found" condition from the backend yields the default manifest;
    /// this is how first-ever pushes proceed without manual bootstrap.
    ///
    /// # Errors
    ///
    /// Returns an error on any other backend failure or on malformed content.
    pub fn load_remote(backend: &dyn StorageBackend, reference: &RemoteRef) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix("confsync-remote-manifest-")
            .suffix(".json")
            .tempfile()
            .map_err(Error::Io)?;
        match backend.pull(reference, staging.path()) {
            Ok(()) => Self::load(staging.path()),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save the manifest to the remote through the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or the upload fails.
    pub fn save_remote(
        &self,
        backend: &dyn StorageBackend,
        reference: &RemoteRef,
    ) -> Result<()> {
        let staging = tempfile::Builder::new()
            .prefix("confsync-remote-manifest-")
            .suffix(".json")
            .tempfile()
            .map_err(Error::Io)?;
        self.save(staging.path())?;
        backend.push(staging.path(), reference)?;
        Ok(())
    }

    /// Recorded revision for a name; absent entries are revision 0.
    pub fn revision_of(&self, name: &str) -> u64 {
        self.entries.get(name).map(|e| e.revision).unwrap_or(0)
    }
}

fn actor_identity() -> String {
    let user = std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let host = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{user}@{host}")
}
