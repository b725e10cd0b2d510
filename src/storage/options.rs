//! Store Configuration
//!
//! [`Options`] is built once by the caller, validated by
//! [`Store::new`](crate::Store::new), and never changes afterwards.

use crate::error::{OptionsError, Result, StoreError};
use crate::storage::expiry::ExpiryMonitor;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Purge interval used when none is configured (1 hour).
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Export interval used when none is configured (1 hour).
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration for a [`Store`](crate::Store).
///
/// Logging goes through `tracing`; install a subscriber in the host process
/// to collect background job failures.
///
/// # Example
///
/// ```
/// use csvdb::Options;
/// use std::time::Duration;
///
/// let options = Options::new("events", "./data")
///     .with_file_ttl(Duration::from_secs(24 * 60 * 60))
///     .with_export_interval(Duration::from_secs(60));
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct Options {
    /// Store name; also the sub-directory and file name prefix
    pub name: String,

    /// Base directory; the store lives in `<dir>/<name>/`
    pub dir: PathBuf,

    /// Age after which a local file is purged (zero = never).
    /// Only used to build the default expiry check when `expiry_monitor` is unset.
    pub file_ttl: Duration,

    /// Custom expiry check; takes priority over `file_ttl`
    pub expiry_monitor: Option<ExpiryMonitor>,

    /// Time between purge runs (zero = [`DEFAULT_PURGE_INTERVAL`])
    pub purge_interval: Duration,

    /// Time between export runs (zero = [`DEFAULT_EXPORT_INTERVAL`])
    pub export_interval: Duration,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("file_ttl", &self.file_ttl)
            .field("expiry_monitor", &self.expiry_monitor.is_some())
            .field("purge_interval", &self.purge_interval)
            .field("export_interval", &self.export_interval)
            .finish()
    }
}

impl Options {
    /// Creates options for the store `name` under `dir`, with defaults for everything else.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the file TTL.
    pub fn with_file_ttl(mut self, ttl: Duration) -> Self {
        self.file_ttl = ttl;
        self
    }

    /// Set a custom expiry check.
    pub fn with_expiry_monitor(mut self, monitor: ExpiryMonitor) -> Self {
        self.expiry_monitor = Some(monitor);
        self
    }

    /// Set the purge interval.
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Set the export interval.
    pub fn with_export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = interval;
        self
    }

    /// Checks the options, reporting every violation at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.name.is_empty() || self.name.contains(['/', '\\', '\0']) {
            errors.push(OptionsError::InvalidName);
        }

        if self.dir.as_os_str().is_empty() {
            errors.push(OptionsError::InvalidDirectory);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::InvalidOptions(errors))
        }
    }

    /// The purge interval with the default applied.
    pub fn effective_purge_interval(&self) -> Duration {
        if self.purge_interval.is_zero() {
            DEFAULT_PURGE_INTERVAL
        } else {
            self.purge_interval
        }
    }

    /// The export interval with the default applied.
    pub fn effective_export_interval(&self) -> Duration {
        if self.export_interval.is_zero() {
            DEFAULT_EXPORT_INTERVAL
        } else {
            self.export_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(options: &Options) -> Vec<OptionsError> {
        match options.validate() {
            Err(StoreError::InvalidOptions(errors)) => errors,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_validate_pass() {
        let options = Options::new("foo", "bar").with_file_ttl(Duration::from_secs(3600));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(
            violations(&Options::new("", "bar")),
            vec![OptionsError::InvalidName]
        );
        assert_eq!(
            violations(&Options::new("a/b", "bar")),
            vec![OptionsError::InvalidName]
        );
    }

    #[test]
    fn test_validate_dir() {
        assert_eq!(
            violations(&Options::new("foo", "")),
            vec![OptionsError::InvalidDirectory]
        );
    }

    #[test]
    fn test_validate_aggregates() {
        assert_eq!(
            violations(&Options::default()),
            vec![OptionsError::InvalidName, OptionsError::InvalidDirectory]
        );
    }

    #[test]
    fn test_default_intervals() {
        let options = Options::new("foo", "bar");
        assert_eq!(options.effective_purge_interval(), DEFAULT_PURGE_INTERVAL);
        assert_eq!(options.effective_export_interval(), DEFAULT_EXPORT_INTERVAL);

        let options = options
            .with_purge_interval(Duration::from_secs(5))
            .with_export_interval(Duration::from_secs(7));
        assert_eq!(options.effective_purge_interval(), Duration::from_secs(5));
        assert_eq!(options.effective_export_interval(), Duration::from_secs(7));
    }
}
