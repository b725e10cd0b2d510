//! In-Memory Backend
//!
//! A [`Backend`] that keeps objects in a `HashMap` guarded by an `RwLock`.
//! Useful for tests, benchmarks and running a store without remote storage
//! while still exercising the import and export paths.

use crate::backend::{Backend, BackendError};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// An in-process object store.
///
/// # Example
///
/// ```
/// use csvdb::backend::{Backend, MemoryBackend};
/// use bytes::Bytes;
///
/// let backend = MemoryBackend::new();
/// backend.insert("events", "events.a.csv", Bytes::from("id\n1\n"));
///
/// let mut out = Vec::new();
/// backend.import("events", "events.a.csv", &mut out).unwrap();
/// assert_eq!(out, b"id\n1\n");
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Objects keyed by `prefix/filename`
    objects: RwLock<HashMap<String, Bytes>>,

    /// Statistics: successful imports
    imports: AtomicU64,

    /// Statistics: successful exports
    exports: AtomicU64,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn object_key(prefix: &str, filename: &str) -> String {
        format!("{}/{}", prefix, filename)
    }

    /// Stores an object directly, bypassing `export`.
    pub fn insert(&self, prefix: &str, filename: &str, body: Bytes) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::object_key(prefix, filename), body);
    }

    /// Returns the stored object, if any.
    pub fn object(&self, prefix: &str, filename: &str) -> Option<Bytes> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&Self::object_key(prefix, filename))
            .cloned()
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful imports so far.
    pub fn import_count(&self) -> u64 {
        self.imports.load(Ordering::Relaxed)
    }

    /// Number of successful exports so far.
    pub fn export_count(&self) -> u64 {
        self.exports.load(Ordering::Relaxed)
    }
}

impl Backend for MemoryBackend {
    fn import(&self, prefix: &str, filename: &str, dst: &mut dyn Write) -> Result<(), BackendError> {
        let body = self
            .object(prefix, filename)
            .ok_or(BackendError::NotFound)?;

        dst.write_all(&body)
            .map_err(|e| BackendError::Other(e.into()))?;

        self.imports.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn export(
        &self,
        prefix: &str,
        filename: &str,
        src: &mut dyn Read,
    ) -> Result<String, BackendError> {
        let mut body = Vec::new();
        src.read_to_end(&mut body)
            .map_err(|e| BackendError::Other(e.into()))?;

        self.insert(prefix, filename, Bytes::from(body));
        self.exports.fetch_add(1, Ordering::Relaxed);
        Ok(filename.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_missing() {
        let backend = MemoryBackend::new();
        let mut out = Vec::new();
        let result = backend.import("foo", "foo.a.csv", &mut out);
        assert!(matches!(result, Err(BackendError::NotFound)));
        assert!(out.is_empty());
        assert_eq!(backend.import_count(), 0);
    }

    #[test]
    fn test_export_then_import() {
        let backend = MemoryBackend::new();
        let mut src: &[u8] = b"foo,bar\n1,1b\n";

        let stored = backend.export("foo", "foo.a.csv", &mut src).unwrap();
        assert_eq!(stored, "foo.a.csv");
        assert_eq!(backend.len(), 1);

        let mut out = Vec::new();
        backend.import("foo", "foo.a.csv", &mut out).unwrap();
        assert_eq!(out, b"foo,bar\n1,1b\n");
        assert_eq!(backend.export_count(), 1);
        assert_eq!(backend.import_count(), 1);
    }

    #[test]
    fn test_prefixes_are_separate() {
        let backend = MemoryBackend::new();
        backend.insert("foo", "x.csv", Bytes::from("a"));
        backend.insert("bar", "x.csv", Bytes::from("b"));

        assert_eq!(backend.object("foo", "x.csv"), Some(Bytes::from("a")));
        assert_eq!(backend.object("bar", "x.csv"), Some(Bytes::from("b")));
        assert!(backend.object("baz", "x.csv").is_none());
    }
}
