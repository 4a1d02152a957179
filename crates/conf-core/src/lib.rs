//! Core protocol layer for confsync
//!
//! Coordinates the leaf crates into the synchronization protocol:
//!
//! - **Settings**: entry declarations, link unions, remote-path defaulting
//! - **Manifest**: the revision ledger, local and remote copies
//! - **SyncCoordinator**: the pull/push/init decision tables
//! - **Links / hooks / library**: materialization after data is in place
//!
//! ```text
//!            CLI
//!             |
//!         conf-core
//!             |
//!      +------+------+
//!      |             |
//!   conf-fs     conf-store
//! ```

pub mod context;
pub mod error;
pub mod hooks;
pub mod library;
pub mod links;
pub mod manifest;
pub mod settings;
pub mod sync;

pub use context::Context;
pub use error::{Error, Result};
pub use manifest::{Manifest, ManifestEntry};
pub use settings::{ConfigEntry, Links, Settings};
pub use sync::{SyncCoordinator, SyncOutcome};
