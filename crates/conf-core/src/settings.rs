//! User settings
//!
//! Settings live in a single JSON file under the state root. Config and
//! library entries share one shape: a name, an optional remote path, link
//! declarations, and post-sync commands. Link declarations accept either a
//! single string or a list; the union is collapsed at the serde boundary and
//! the rest of the system only ever sees an ordered list.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use conf_store::StoreConfig;

use crate::{Error, Result};

/// Default remote prefix for managed config entries
pub const DEFAULT_CFG_PREFIX: &str = "confsync/cfg";
/// Default remote prefix for library entries
pub const DEFAULT_LIB_PREFIX: &str = "confsync/lib";

const SETTINGS_VERSION: u32 = 1;

fn default_version() -> u32 {
    SETTINGS_VERSION
}

/// Parsed contents of `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub cfg: Vec<ConfigEntry>,
    #[serde(default)]
    pub lib: Vec<ConfigEntry>,
    #[serde(default)]
    pub oss: StoreConfig,
}

/// One declared entry, immutable for the duration of a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    /// Remote location; defaulted from the bucket when absent
    #[serde(default)]
    pub oss: String,
    #[serde(default)]
    pub link: Links,
    #[serde(default)]
    pub cmd: Vec<String>,
}

/// Ordered link declarations, normalized from string-or-list JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "LinkSpec")]
pub struct Links(pub Vec<String>);

impl Links {
    pub fn items(&self) -> &[String] {
        &self.0
    }
}

/// The raw union shape accepted in settings files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkSpec {
    Single(String),
    Many(Vec<String>),
}

impl From<LinkSpec> for Links {
    fn from(spec: LinkSpec) -> Self {
        match spec {
            LinkSpec::Single(item) => Links(vec![item]),
            LinkSpec::Many(items) => Links(items),
        }
    }
}

impl Settings {
    /// Load and normalize settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, malformed, or an entry
    /// needs a defaulted remote path while no bucket is configured.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::SettingsNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let mut settings: Settings =
            serde_json::from_str(&content).map_err(|e| Error::SettingsParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        settings.normalize_remote_paths()?;
        Ok(settings)
    }

    /// Fill in defaulted remote paths for entries that declare none.
    pub fn normalize_remote_paths(&mut self) -> Result<()> {
        let bucket = self.oss.bucket_name();
        let scheme = self.oss.scheme();
        for entry in self.cfg.iter_mut() {
            normalize_entry(entry, scheme, &bucket, DEFAULT_CFG_PREFIX)?;
        }
        for entry in self.lib.iter_mut() {
            normalize_entry(entry, scheme, &bucket, DEFAULT_LIB_PREFIX)?;
        }
        Ok(())
    }

    /// Look up a managed config entry by name.
    pub fn find_cfg(&self, name: &str) -> Result<&ConfigEntry> {
        find_entry(&self.cfg, name)
    }

    /// Look up a library entry by name.
    pub fn find_lib(&self, name: &str) -> Result<&ConfigEntry> {
        find_entry(&self.lib, name)
    }
}

fn normalize_entry(
    entry: &mut ConfigEntry,
    scheme: &str,
    bucket: &str,
    prefix: &str,
) -> Result<()> {
    if !entry.oss.trim().is_empty() {
        return Ok(());
    }
    if bucket.is_empty() {
        return Err(Error::MissingRemoteDefault {
            name: entry.name.clone(),
        });
    }
    entry.oss = format!("{scheme}://{bucket}/{prefix}/{}", entry.name);
    Ok(())
}

fn find_entry<'a>(entries: &'a [ConfigEntry], name: &str) -> Result<&'a ConfigEntry> {
    entries
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| Error::EntryNotFound {
            name: name.to_string(),
        })
}
