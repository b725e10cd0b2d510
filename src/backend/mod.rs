//! Backend Gateway
//!
//! The backend is the remote object store a [`Store`](crate::Store) sits in
//! front of. The store only ever asks it two things:
//!
//! - **import**: stream the bytes of one file into a local destination, on a
//!   cache miss.
//! - **export**: upload the bytes of one local file, during a scheduled or
//!   final export.
//!
//! Objects are addressed by a prefix (the store name) and a file name
//! (`<name>.<key>.csv`).
//!
//! ```text
//! ┌──────────────┐   miss: import()    ┌──────────────────┐
//! │    Store     │ ──────────────────> │     Backend      │
//! │ (local dir)  │ <────────────────── │  (object store)  │
//! └──────────────┘   export: export()  └──────────────────┘
//! ```

pub mod memory;

pub use memory::MemoryBackend;

use std::io::{Read, Write};
use thiserror::Error;

/// Errors reported by a [`Backend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The requested object does not exist remotely
    #[error("object not found")]
    NotFound,

    /// Any other failure (network, auth, throttling, ...)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Remote storage the store imports missing keys from and exports changes to.
///
/// Implementations must be safe to call from several threads at once; the
/// store makes no assumptions about ordering between calls.
pub trait Backend: Send + Sync {
    /// Writes the bytes of `prefix/filename` into `dst`.
    ///
    /// Returns [`BackendError::NotFound`] when the object does not exist.
    fn import(&self, prefix: &str, filename: &str, dst: &mut dyn Write) -> Result<(), BackendError>;

    /// Uploads the bytes read from `src` as `prefix/filename`.
    ///
    /// Returns the name the object was stored under, normally `filename`.
    fn export(&self, prefix: &str, filename: &str, src: &mut dyn Read)
        -> Result<String, BackendError>;
}
