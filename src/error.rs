//! Error types for csvdb.
//!
//! Every fallible store operation returns [`StoreError`]. The variants follow
//! the store's failure modes:
//!
//! - **Configuration**: [`StoreError::InvalidOptions`] carries every violation found,
//!   not only the first one.
//! - **Not found**: [`StoreError::EntryNotFound`] when a key is absent both locally
//!   and remotely.
//! - **Unavailable collaborator**: [`StoreError::BackendNotSet`].
//! - **Contention**: [`StoreError::PurgeIsActive`] and [`StoreError::ExportIsActive`]
//!   when a background job is started while its previous run is still going.
//! - **I/O**: [`StoreError::Io`], [`StoreError::Csv`] and [`StoreError::Backend`],
//!   carrying the operation and file they failed on.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single reason why [`Options`](crate::storage::Options) failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// The store name is empty or contains a path separator
    #[error("invalid name, cannot be empty or contain path separators")]
    InvalidName,

    /// The base directory is empty
    #[error("invalid dir, cannot be empty")]
    InvalidDirectory,
}

/// Errors returned by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key exists neither locally nor in the backend
    #[error("entry not found")]
    EntryNotFound,

    /// A download was required but no backend is configured
    #[error("backend not set")]
    BackendNotSet,

    /// An export was started while the previous one is still running
    #[error(
        "cannot start export as export is still active; if this error is frequent, consider increasing the export interval"
    )]
    ExportIsActive,

    /// A purge was started while the previous one is still running
    #[error(
        "cannot start purge as purge is still active; if this error is frequent, consider increasing the purge interval"
    )]
    PurgeIsActive,

    /// The options failed validation
    #[error("invalid options: {}", join_errors(.0))]
    InvalidOptions(Vec<OptionsError>),

    /// The key cannot be mapped onto a file inside the store directory
    #[error("invalid key {0:?}: keys cannot be empty or contain path separators")]
    InvalidKey(String),

    /// A filesystem operation failed
    #[error("failed to {op} <{}>: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rows could not be encoded or decoded
    #[error("malformed rows in <{}>: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The backend failed for a reason other than a missing object
    #[error("backend {op} failed for <{name}>: {source}")]
    Backend {
        op: &'static str,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// An error raised by caller code, such as an `append_with` transform
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true for the errors `get_merged` treats as "skip this key".
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::EntryNotFound | StoreError::BackendNotSet)
    }
}

fn join_errors(errors: &[OptionsError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
