//! Command context
//!
//! One explicit value carrying the state-root directory and the parsed
//! settings, threaded into every component constructor. There is no ambient
//! global state anywhere in the workspace.

use std::path::{Path, PathBuf};

use conf_store::RemoteRef;

use crate::settings::Settings;
use crate::Result;

/// Well-known key of the remote manifest object under the bucket root.
pub const REMOTE_MANIFEST_KEY: &str = "confsync/cfg/manifest.json";

#[derive(Debug, Clone)]
pub struct Context {
    /// State-root directory (settings, manifest, managed directories)
    pub dir: PathBuf,
    pub settings: Settings,
}

impl Context {
    pub fn new(dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            dir: dir.into(),
            settings,
        }
    }

    /// Load settings from `<dir>/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is missing or malformed.
    pub fn load(dir: &Path) -> Result<Self> {
        let settings = Settings::load(&dir.join("settings.json"))?;
        Ok(Self::new(dir, settings))
    }

    /// Managed local directory for a config entry.
    pub fn cfg_dir(&self, name: &str) -> PathBuf {
        self.dir.join("cfg").join(name)
    }

    /// Local directory for a library entry.
    pub fn lib_dir(&self, name: &str) -> PathBuf {
        self.dir.join("lib").join(name)
    }

    /// Path of the local manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("cfg").join("manifest.json")
    }

    /// Reference of the remote manifest object.
    pub fn remote_manifest_ref(&self) -> RemoteRef {
        RemoteRef::new(
            self.settings.oss.scheme(),
            &self.settings.oss.bucket_name(),
            REMOTE_MANIFEST_KEY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_the_state_dir() {
        let settings: Settings = serde_json::from_str(r#"{}"#).unwrap();
        let ctx = Context::new("/state", settings);
        assert_eq!(ctx.cfg_dir("nvim"), PathBuf::from("/state/cfg/nvim"));
        assert_eq!(ctx.lib_dir("jdk"), PathBuf::from("/state/lib/jdk"));
        assert_eq!(
            ctx.manifest_path(),
            PathBuf::from("/state/cfg/manifest.json")
        );
    }

    #[test]
    fn remote_manifest_ref_uses_the_configured_bucket() {
        let settings: Settings = serde_json::from_str(
            r#"{"oss": {"bucket": "b", "endpoint": "e"}}"#,
        )
        .unwrap();
        let ctx = Context::new("/state", settings);
        assert_eq!(
            ctx.remote_manifest_ref().to_string(),
            "oss://b/confsync/cfg/manifest.json"
        );
    }
}
