//! Error types for conf-store

use std::path::PathBuf;

/// Result type for conf-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in conf-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither a matching object nor any object under the prefix exists
    #[error("Remote object or prefix not found: {reference}")]
    NotFound { reference: String },

    #[error("Invalid remote reference {reference}: {message}")]
    InvalidRef { reference: String, message: String },

    #[error("Remote reference names namespace {found} but the backend is configured for {expected}")]
    NamespaceMismatch { expected: String, found: String },

    #[error("Remote reference uses scheme {found} but the backend serves {expected}")]
    SchemeMismatch { expected: String, found: String },

    /// A remote operation failed; names the operation and the object key
    #[error("Store {operation} failed for object {key}: {message}")]
    Backend {
        operation: String,
        key: String,
        message: String,
    },

    #[error("Store configuration error: {message}")]
    Config { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] conf_fs::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn backend(
        operation: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            operation: operation.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the distinguished "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
