//! The sync protocol
//!
//! The coordinator compares the local and remote manifests for one entry and
//! decides, per invocation, whether to transfer, skip as already-consistent,
//! or refuse with a conflict. All decision state is four values: the local
//! revision, the remote revision, whether a remote entry exists, and whether
//! local content matches the remote entry's recorded file list.
//!
//! Known limitation: the read-decide-write sequence against the remote
//! manifest is not atomic. Two machines racing to push the same entry can
//! both observe revision N, both write N+1, and the second write wins with
//! no detection. The protocol detects divergence; it does not lock.

use std::cmp::Ordering;
use std::fs;

use conf_fs::{records_equal, snapshot_dir};
use conf_store::{RemoteRef, StorageBackend, open_backend};

use crate::context::Context;
use crate::hooks;
use crate::links;
use crate::manifest::{Manifest, ManifestEntry};
use crate::settings::ConfigEntry;
use crate::{Error, Result};

/// How a pull/push/init invocation ended, short of an error.
///
/// The CLI prints "completed" and "skipped" outcomes distinctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    Skipped { reason: String },
}

impl SyncOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Owns all protocol decisions; every other component is a stateless
/// utility it calls into.
pub struct SyncCoordinator {
    ctx: Context,
    backend: Box<dyn StorageBackend>,
}

impl SyncCoordinator {
    pub fn new(ctx: Context, backend: Box<dyn StorageBackend>) -> Self {
        Self { ctx, backend }
    }

    /// Build a coordinator with the backend selected by the settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the store configuration is incomplete.
    pub fn open(ctx: Context) -> Result<Self> {
        let backend = open_backend(&ctx.settings.oss)?;
        Ok(Self::new(ctx, backend))
    }

    /// Synchronize the local replica of `name` from the remote.
    ///
    /// # Errors
    ///
    /// Conflict errors when local state is ahead of or diverged from the
    /// remote; backend and filesystem errors otherwise. A refused pull
    /// performs no mutation.
    pub fn pull(&self, name: &str) -> Result<SyncOutcome> {
        let entry = self.ctx.settings.find_cfg(name)?;
        let remote_manifest =
            Manifest::load_remote(self.backend.as_ref(), &self.ctx.remote_manifest_ref())?;
        let mut local_manifest = Manifest::load(&self.ctx.manifest_path())?;

        let remote_entry = remote_manifest.entries.get(name);
        let local_revision = local_manifest.revision_of(name);
        let remote_revision = remote_entry.map(|e| e.revision).unwrap_or(0);
        let cfg_dir = self.ctx.cfg_dir(name);
        tracing::debug!(name, local_revision, remote_revision, "pull decision");

        match local_revision.cmp(&remote_revision) {
            Ordering::Greater => Err(Error::LocalAhead {
                name: name.to_string(),
                local: local_revision,
                remote: remote_revision,
            }),
            Ordering::Equal => match remote_entry {
                None => {
                    let local_files = snapshot_dir(&cfg_dir)?;
                    if local_files.is_empty() {
                        Ok(SyncOutcome::skipped(
                            "no remote manifest entry exists and no local files were found",
                        ))
                    } else {
                        Err(Error::DivergedWithoutRemoteEntry {
                            name: name.to_string(),
                            revision: local_revision,
                        })
                    }
                }
                Some(remote_entry) => {
                    // A locally deleted managed directory at the same
                    // revision is treated as a lost copy, not divergence.
                    if fs::symlink_metadata(&cfg_dir).is_err() {
                        self.transfer(entry, remote_entry, &mut local_manifest)?;
                        return Ok(SyncOutcome::Completed);
                    }
                    let local_files = snapshot_dir(&cfg_dir)?;
                    if records_equal(&local_files, &remote_entry.files) {
                        Ok(SyncOutcome::skipped(
                            "local and remote content are already identical",
                        ))
                    } else {
                        Err(Error::DivergedAtRevision {
                            name: name.to_string(),
                            revision: local_revision,
                        })
                    }
                }
            },
            Ordering::Less => match remote_entry {
                Some(remote_entry) => {
                    self.transfer(entry, remote_entry, &mut local_manifest)?;
                    Ok(SyncOutcome::Completed)
                }
                None => Err(Error::RemoteEntryMissing {
                    name: name.to_string(),
                    remote: remote_revision,
                }),
            },
        }
    }

    /// Publish the local replica of `name` to the remote.
    ///
    /// Skips without a revision bump when local content already matches the
    /// remote entry. Otherwise uploads the directory, then records
    /// `local revision + 1` in the remote manifest and then the local one.
    ///
    /// # Errors
    ///
    /// A conflict error when the local revision is behind the remote;
    /// backend and filesystem errors otherwise.
    pub fn push(&self, name: &str) -> Result<SyncOutcome> {
        let entry = self.ctx.settings.find_cfg(name)?;
        let cfg_dir = self.ctx.cfg_dir(name);
        if !cfg_dir.exists() {
            return Err(Error::PushSourceMissing { path: cfg_dir });
        }

        let remote_manifest_ref = self.ctx.remote_manifest_ref();
        let mut remote_manifest =
            Manifest::load_remote(self.backend.as_ref(), &remote_manifest_ref)?;
        let mut local_manifest = Manifest::load(&self.ctx.manifest_path())?;

        let local_revision = local_manifest.revision_of(name);
        let remote_revision = remote_manifest.revision_of(name);
        if local_revision < remote_revision {
            return Err(Error::LocalBehind {
                name: name.to_string(),
                local: local_revision,
                remote: remote_revision,
            });
        }

        let files = snapshot_dir(&cfg_dir)?;
        if let Some(remote_entry) = remote_manifest.entries.get(name) {
            if records_equal(&files, &remote_entry.files) {
                return Ok(SyncOutcome::skipped(
                    "local and remote content are already identical",
                ));
            }
        }

        let new_revision = local_revision + 1;
        let new_entry = ManifestEntry::build(&cfg_dir, new_revision, files)?;
        tracing::debug!(name, new_revision, "pushing entry");

        let remote_ref = RemoteRef::parse(&entry.oss)?;
        self.backend.push(&cfg_dir, &remote_ref)?;

        remote_manifest
            .entries
            .insert(name.to_string(), new_entry.clone());
        local_manifest.entries.insert(name.to_string(), new_entry);

        // Remote first: a crash between the writes leaves the local manifest
        // under-reporting the pushed revision, which a later pull repairs by
        // re-downloading. Wasteful, not incorrect.
        remote_manifest.save_remote(self.backend.as_ref(), &remote_manifest_ref)?;
        local_manifest.save(&self.ctx.manifest_path())?;

        Ok(SyncOutcome::Completed)
    }

    /// Migrate a pre-existing plain directory into sync management.
    ///
    /// Copies the primary link directory into the managed location (staged),
    /// seeds revision 1 via push, and only after that succeeds removes the
    /// original and materializes the symlinks.
    ///
    /// # Errors
    ///
    /// Configuration errors for a bad primary link; filesystem and backend
    /// errors otherwise. A failure before the push leaves the original
    /// directory untouched.
    pub fn init(&self, name: &str) -> Result<SyncOutcome> {
        let entry = self.ctx.settings.find_cfg(name)?;
        let cfg_dir = self.ctx.cfg_dir(name);
        let plans = links::build_plans(name, entry.link.items(), &cfg_dir)?;
        let primary = links::primary_link_path(name, entry.link.items(), &plans)?;
        let managed = links::absolutize(&cfg_dir)?;

        let metadata = match fs::symlink_metadata(&primary) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::InitMissingSource { path: primary });
            }
            Err(e) => return Err(Error::Io(e)),
            Ok(metadata) => metadata,
        };
        if metadata.file_type().is_symlink() {
            let target = links::resolve_link_target(&primary)?;
            if target == managed {
                return Ok(SyncOutcome::skipped("the link path is already initialized"));
            }
            return Err(Error::InitUnexpectedSymlink { path: primary });
        }
        if !metadata.is_dir() {
            return Err(Error::InitNotADirectory { path: primary });
        }
        if fs::symlink_metadata(&cfg_dir).is_ok() {
            return Err(Error::InitLocalDirExists { path: cfg_dir });
        }

        conf_fs::io::copy_dir_staged(&primary, &cfg_dir)?;
        self.push(name)?;
        fs::remove_dir_all(&primary).map_err(Error::Io)?;
        links::ensure_symlinks(&plans)?;
        hooks::run_post_sync(&entry.cmd)?;

        Ok(SyncOutcome::Completed)
    }

    /// Stage the remote content, commit it atomically, adopt the remote
    /// entry locally, then materialize links and run post-sync commands.
    fn transfer(
        &self,
        entry: &ConfigEntry,
        remote_entry: &ManifestEntry,
        local_manifest: &mut Manifest,
    ) -> Result<()> {
        let name = &entry.name;
        let cfg_dir = self.ctx.cfg_dir(name);
        let staging = conf_fs::io::staging_path(&cfg_dir);
        let _ = fs::remove_dir_all(&staging);
        if let Some(parent) = cfg_dir.parent() {
            fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let remote_ref = RemoteRef::parse(&entry.oss)?;
        if let Err(e) = self.backend.pull(&remote_ref, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }
        if let Err(e) = conf_fs::io::replace_dir(&cfg_dir, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        local_manifest
            .entries
            .insert(name.clone(), remote_entry.clone());
        local_manifest.save(&self.ctx.manifest_path())?;

        let plans = links::build_plans(name, entry.link.items(), &cfg_dir)?;
        links::ensure_symlinks(&plans)?;
        hooks::run_post_sync(&entry.cmd)?;
        Ok(())
    }
}
