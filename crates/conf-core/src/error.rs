//! Error types for conf-core
//!
//! Variants group into the four fatal kinds the protocol distinguishes:
//! configuration errors, conflict errors (one per decision-table refusal),
//! backend errors (wrapped from conf-store), and filesystem errors (wrapped
//! from conf-fs / std). None are retried.

use std::path::PathBuf;

/// Result type for conf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in conf-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --- configuration ---
    #[error("Configuration entry not found: {name}")]
    EntryNotFound { name: String },

    #[error("Entry {name} has no remote path and oss.bucket is empty, so no default can be derived")]
    MissingRemoteDefault { name: String },

    #[error("Invalid link configuration for {name}: {message}")]
    LinkConfig { name: String, message: String },

    #[error("Settings file not found at {path}")]
    SettingsNotFound { path: PathBuf },

    #[error("Failed to parse settings file at {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    // --- conflicts: require explicit user action, never auto-resolved ---
    #[error(
        "Pull for {name} refused: local revision {local} is ahead of remote revision {remote}; push first"
    )]
    LocalAhead { name: String, local: u64, remote: u64 },

    #[error(
        "Pull for {name} refused: local content diverged from the remote manifest at revision {revision}"
    )]
    DivergedAtRevision { name: String, revision: u64 },

    #[error(
        "Pull for {name} refused: local files exist but no remote manifest entry is recorded at revision {revision}"
    )]
    DivergedWithoutRemoteEntry { name: String, revision: u64 },

    #[error("Pull for {name} failed: the remote manifest entry is missing at claimed revision {remote}")]
    RemoteEntryMissing { name: String, remote: u64 },

    #[error(
        "Push for {name} refused: local revision {local} is behind remote revision {remote}; pull first"
    )]
    LocalBehind { name: String, local: u64, remote: u64 },

    // --- manifests ---
    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to serialize manifest: {message}")]
    ManifestSerialize { message: String },

    // --- push / init / library preconditions ---
    #[error("Push source directory does not exist: {path}")]
    PushSourceMissing { path: PathBuf },

    #[error("Init failed: the configured link path does not exist: {path}")]
    InitMissingSource { path: PathBuf },

    #[error("Init failed: the configured link path is an unexpected symbolic link: {path}")]
    InitUnexpectedSymlink { path: PathBuf },

    #[error("Init failed: the configured link path is not a directory: {path}")]
    InitNotADirectory { path: PathBuf },

    #[error("Init failed: the managed local directory already exists: {path}")]
    InitLocalDirExists { path: PathBuf },

    #[error("Library pull failed: the local library directory already exists: {path}")]
    LibraryDirExists { path: PathBuf },

    #[error("Library pull failed: the link path already exists: {path}")]
    LinkPathExists { path: PathBuf },

    // --- symlinks ---
    #[error("Cannot create symbolic link: the link path is occupied by a file or directory: {path}")]
    LinkOccupied { path: PathBuf },

    #[error(
        "Cannot create symbolic link {link}: it points to {current}, expected {expected}"
    )]
    LinkTargetMismatch {
        link: PathBuf,
        current: PathBuf,
        expected: PathBuf,
    },

    // --- post-sync commands ---
    #[error("Post-sync command {index} failed ({command}): {message}")]
    HookFailed {
        index: usize,
        command: String,
        message: String,
    },

    // Transparent wrappers for underlying crate errors
    #[error(transparent)]
    Fs(#[from] conf_fs::Error),

    #[error(transparent)]
    Store(#[from] conf_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a conflict the user must resolve with an explicit
    /// pull or push.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::LocalAhead { .. }
                | Self::DivergedAtRevision { .. }
                | Self::DivergedWithoutRemoteEntry { .. }
                | Self::RemoteEntryMissing { .. }
                | Self::LocalBehind { .. }
        )
    }
}
