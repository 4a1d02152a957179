//! Filesystem layer for confsync
//!
//! Provides content snapshots, checksums, and the staged-write primitives
//! (atomic file replacement, staged directory copy/swap) that the sync
//! protocol relies on to never expose partially written state.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;
pub mod snapshot;

pub use error::{Error, Result};
pub use snapshot::{FileRecord, records_equal, records_sha256, snapshot_dir};
