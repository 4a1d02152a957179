//! Storage backends for confsync
//!
//! The sync protocol talks to a remote object namespace through the
//! [`StorageBackend`] trait: download an object or object tree, upload a
//! file or directory, with a distinguished "not found" condition. Two
//! implementations exist: the Aliyun OSS REST client and a local-directory
//! backend used for the `local` provider and in tests.

pub mod backend;
pub mod error;
pub mod fs;
pub mod oss;
pub mod remote;

pub use backend::{StorageBackend, StoreConfig, open_backend};
pub use error::{Error, Result};
pub use fs::FsBackend;
pub use oss::OssBackend;
pub use remote::RemoteRef;
