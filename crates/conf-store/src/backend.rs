//! The storage backend contract and provider dispatch

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fs::FsBackend;
use crate::oss::OssBackend;
use crate::remote::RemoteRef;
use crate::{Error, Result};

/// Opaque get/put operations against a remote object namespace.
///
/// `pull` downloads a single object to `dst`, or, when `src` addresses a
/// prefix with no single matching object, recursively downloads everything
/// under that prefix into `dst` (replacing its prior contents). It fails
/// with [`Error::NotFound`] when neither exists.
///
/// `push` uploads a single file, or, for a directory, deletes all existing
/// remote objects under the target prefix and re-uploads the full tree.
pub trait StorageBackend {
    fn pull(&self, src: &RemoteRef, dst: &Path) -> Result<()>;
    fn push(&self, src: &Path, dst: &RemoteRef) -> Result<()>;
}

/// The `oss` section of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Provider name: "aliyun-oss" (default) or "local"
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub bucket: String,
    /// OSS region endpoint, or the root directory for the local provider
    #[serde(default)]
    pub endpoint: String,
}

impl StoreConfig {
    /// The namespace (bucket) name with surrounding slashes stripped.
    pub fn bucket_name(&self) -> String {
        self.bucket.trim_matches('/').to_string()
    }

    /// The remote-reference scheme this provider serves.
    pub fn scheme(&self) -> &'static str {
        if self.name == "local" { "file" } else { "oss" }
    }
}

/// Construct the backend selected by the store configuration.
///
/// # Errors
///
/// Returns an error for unknown providers or incomplete credentials.
pub fn open_backend(config: &StoreConfig) -> Result<Box<dyn StorageBackend>> {
    match config.name.as_str() {
        "" | "aliyun-oss" => Ok(Box::new(OssBackend::new(config.clone())?)),
        "local" => {
            if config.endpoint.is_empty() {
                return Err(Error::Config {
                    message: "local provider requires endpoint to name a root directory"
                        .to_string(),
                });
            }
            let root = conf_fs::path::expand_user(&config.endpoint)?;
            Ok(Box::new(FsBackend::new(root, config.bucket_name())))
        }
        other => Err(Error::Config {
            message: format!("unsupported store provider: {other}"),
        }),
    }
}
