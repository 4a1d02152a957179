//! Unversioned library pull
//!
//! Libraries are one-shot downloads: no manifest, no revisions, no
//! re-sync. The pull refuses to touch anything that already exists, fetches
//! the remote tree straight into place, and materializes the links.

use std::fs;

use conf_store::{RemoteRef, StorageBackend};

use crate::context::Context;
use crate::links;
use crate::{Error, Result};

/// Fetch a library entry and materialize its links.
///
/// # Errors
///
/// Fails when the local library directory or any planned link path already
/// exists, and on backend or filesystem failures.
pub fn pull(ctx: &Context, backend: &dyn StorageBackend, name: &str) -> Result<()> {
    let entry = ctx.settings.find_lib(name)?;
    let lib_dir = ctx.lib_dir(name);
    let plans = links::build_plans(name, entry.link.items(), &lib_dir)?;

    if fs::symlink_metadata(&lib_dir).is_ok() {
        return Err(Error::LibraryDirExists { path: lib_dir });
    }
    for plan in &plans {
        if fs::symlink_metadata(&plan.link).is_ok() {
            return Err(Error::LinkPathExists {
                path: plan.link.clone(),
            });
        }
    }

    if let Some(parent) = lib_dir.parent() {
        fs::create_dir_all(parent).map_err(Error::Io)?;
    }
    let remote_ref = RemoteRef::parse(&entry.oss)?;
    backend.pull(&remote_ref, &lib_dir)?;
    links::ensure_symlinks(&plans)?;
    Ok(())
}
