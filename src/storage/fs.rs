//! File opening, behind a trait so tests can inject failures.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Opens the files the store writes to.
pub trait FileOpener: Send + Sync {
    /// Opens `path` for reading and appending, creating it if missing.
    fn open_append(&self, path: &Path) -> io::Result<File>;

    /// Creates `path` for reading and writing. Fails if it already exists.
    fn create(&self, path: &Path) -> io::Result<File>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileOpener;

impl FileOpener for OsFileOpener {
    fn open_append(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
    }

    fn create(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)
    }
}
