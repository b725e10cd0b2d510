//! Row Encoding and the Row Scanner
//!
//! A key's file is a comma-delimited table: row 0 holds the column names,
//! every following row holds the cells of one entry. Cells are quoted only
//! when they need to be (commas, quotes, newlines), and rows end with `\n`.
//!
//! ```text
//! foo,bar        <- header, from the first entry's keys()
//! 1,1b           <- one row per appended entry
//! 2,"2,b"
//! ```
//!
//! Writing goes through [`write_entries`], which the store calls with the
//! key's shard lock held. Reading for read-modify-append workflows goes
//! through [`Rows`], handed to `append_with` transforms.

use crate::codec::Entry;
use crate::error::{Result, StoreError};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

/// Appends `entries` to the end of `file`, writing a header row first when
/// the file is empty.
///
/// The data is flushed and synced before returning.
///
/// # Returns
///
/// The number of value rows written (the header is not counted).
pub(crate) fn write_entries<T: Entry>(file: &File, path: &Path, entries: &[T]) -> Result<usize> {
    let Some(first) = entries.first() else {
        return Ok(0);
    };

    let is_new = file
        .metadata()
        .map_err(|e| StoreError::io("stat", path, e))?
        .len()
        == 0;

    let mut handle = file;
    handle
        .seek(SeekFrom::End(0))
        .map_err(|e| StoreError::io("seek", path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(handle);

    if is_new {
        writer
            .write_record(first.keys())
            .map_err(|e| StoreError::csv(path, e))?;
    }

    for entry in entries {
        writer
            .write_record(entry.values())
            .map_err(|e| StoreError::csv(path, e))?;
    }

    writer
        .flush()
        .map_err(|e| StoreError::io("flush", path, e))?;
    file.sync_data()
        .map_err(|e| StoreError::io("sync", path, e))?;

    Ok(entries.len())
}

/// A forward-only scanner over the rows of one open file.
///
/// Handed to `append_with` transforms so they can read what a key already
/// holds before deciding what to append.
#[derive(Debug)]
pub struct Rows<'a> {
    file: &'a File,
    path: &'a Path,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(file: &'a File, path: &'a Path) -> Self {
        Self { file, path }
    }

    /// Calls `visit` with the cells of every row after the header, in file order.
    ///
    /// The scan always starts from the beginning of the file, so it may be
    /// called more than once. An empty file yields no rows. The first error
    /// returned by `visit` stops the scan and is returned as-is.
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.append_with("visits", |rows| {
    ///     let mut seen = 0;
    ///     rows.for_each(|_| {
    ///         seen += 1;
    ///         Ok(())
    ///     })?;
    ///     Ok(vec![Visit::new("home", seen)])
    /// })?;
    /// ```
    pub fn for_each<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[String]) -> Result<()>,
    {
        let mut handle = self.file;
        handle
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("rewind", self.path, e))?;

        let len = self
            .file
            .metadata()
            .map_err(|e| StoreError::io("stat", self.path, e))?
            .len();
        if len == 0 {
            return Ok(());
        }

        // has_headers makes the reader consume row 0 before the first record
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(handle);

        let mut record = csv::StringRecord::new();
        let mut row = Vec::new();
        while reader
            .read_record(&mut record)
            .map_err(|e| StoreError::csv(self.path, e))?
        {
            row.clear();
            row.extend(record.iter().map(str::to_owned));
            visit(&row)?;
        }

        Ok(())
    }
}
