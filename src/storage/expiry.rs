//! Expiry Policy
//!
//! Decides whether a local file is stale and may be purged. Staleness is a
//! pure function of the file name and its metadata; by default it compares
//! the file's modification time against the store's TTL.
//!
//! ## Policies
//!
//! - **Never**: a TTL of zero keeps files forever
//! - **Ttl**: a file is expired once `now - mtime >= ttl`
//! - **Custom**: a caller-supplied [`ExpiryMonitor`], which always wins over the TTL

use crate::storage::Options;
use std::fmt;
use std::fs::Metadata;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A custom expiry check: `(file name, metadata) -> expired`.
pub type ExpiryMonitor = Arc<dyn Fn(&str, &Metadata) -> bool + Send + Sync>;

/// How a store decides which local files are stale.
#[derive(Clone)]
pub enum ExpiryPolicy {
    /// Files never expire
    Never,

    /// Files expire once their last modification is at least this old
    Ttl(Duration),

    /// Files expire when the monitor says so
    Custom(ExpiryMonitor),
}

impl fmt::Debug for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryPolicy::Never => write!(f, "Never"),
            ExpiryPolicy::Ttl(ttl) => f.debug_tuple("Ttl").field(ttl).finish(),
            ExpiryPolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ExpiryPolicy {
    /// Builds the policy described by `options`.
    pub fn from_options(options: &Options) -> Self {
        match &options.expiry_monitor {
            Some(monitor) => ExpiryPolicy::Custom(Arc::clone(monitor)),
            None => Self::from_ttl(options.file_ttl),
        }
    }

    /// A TTL policy, or [`ExpiryPolicy::Never`] for a zero TTL.
    pub fn from_ttl(ttl: Duration) -> Self {
        if ttl.is_zero() {
            ExpiryPolicy::Never
        } else {
            ExpiryPolicy::Ttl(ttl)
        }
    }

    /// Returns true if the file should be purged.
    pub fn is_expired(&self, filename: &str, info: &Metadata) -> bool {
        match self {
            ExpiryPolicy::Never => false,
            ExpiryPolicy::Ttl(ttl) => is_older_than(info, *ttl, SystemTime::now()),
            ExpiryPolicy::Custom(monitor) => monitor(filename, info),
        }
    }
}

/// A file whose mtime cannot be read, or lies in the future, is never too old.
fn is_older_than(info: &Metadata, ttl: Duration, now: SystemTime) -> bool {
    info.modified()
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age >= ttl)
}
