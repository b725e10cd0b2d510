//! Keyed Store Engine
//!
//! This module implements the core of csvdb: a directory of append-only CSV
//! files, one per key, fronting a remote [`Backend`].
//!
//! ## Design Decisions
//!
//! 1. **Cache-Aside Reads**: A key is served from its local file; only a miss goes to the backend,
//!    and the downloaded copy is kept locally.
//! 2. **Sharded Locks**: Instead of one big lock, files are spread over 64 `RwLock` shards by
//!    file name. Operations on keys in different shards never wait on each other.
//! 3. **Single-Flight Jobs**: Purge and export each have their own lock, taken with `try_lock`.
//!    A second run while one is active fails fast instead of queueing.
//! 4. **Export Markers**: A zero-length `<file>.exported` sibling records when a file was last
//!    exported. A file is exported again only once it has been modified since.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │  per-file │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │  reads &  │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘  writes   │
//! │  ┌──────────────────┐   ┌──────────────────┐               │
//! │  │ purge_lock       │   │ export_lock      │  single-flight│
//! │  │ (try_lock)       │   │ (try_lock)       │  jobs         │
//! │  └──────────────────┘   └──────────────────┘               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads of a present file take the shard's read lock. Appends, deletes,
//! downloads and purge deletions take the write lock. Exports hold the read
//! lock while uploading, so no append can land between the upload and the
//! marker refresh.
//!
//! Only one process may use a store directory at a time; there is no
//! OS-level file locking.

use crate::backend::{Backend, BackendError};
use crate::codec::rows::{write_entries, Rows};
use crate::codec::Entry;
use crate::error::{Result, StoreError};
use crate::storage::expiry::ExpiryPolicy;
use crate::storage::fs::{FileOpener, OsFileOpener};
use crate::storage::options::Options;
use crate::storage::scheduler::Scheduler;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File, Metadata};
use std::hash::{Hash, Hasher};
use std::io::{self, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Number of lock shards.
/// More shards = less lock contention between keys.
const NUM_SHARDS: usize = 64;

/// Extension of every data file.
const DATA_EXTENSION: &str = "csv";

/// Suffix of export marker files.
const MARKER_SUFFIX: &str = ".exported";

/// Store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Value rows appended
    pub appended_rows: u64,
    /// Files downloaded from the backend
    pub downloads: u64,
    /// Files exported to the backend
    pub exports: u64,
    /// Files removed by purges
    pub purged: u64,
}

/// A named, directory-rooted collection of keyed CSV files.
///
/// Every key maps to `<dir>/<name>/<name>.<key>.csv`. Entries of type `T` are
/// appended as rows; reads return the raw file bytes.
///
/// # Thread Safety
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// threads. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use csvdb::{Entry, Options, Store};
///
/// struct Visit(String);
///
/// impl Entry for Visit {
///     fn keys(&self) -> Vec<String> {
///         vec!["page".into()]
///     }
///
///     fn values(&self) -> Vec<String> {
///         vec![self.0.clone()]
///     }
/// }
///
/// let dir = tempfile::TempDir::new().unwrap();
/// let store: Store<Visit> = Store::new(Options::new("visits", dir.path()), None).unwrap();
///
/// store.append("today", &[Visit("home".into()), Visit("about".into())]).unwrap();
///
/// let mut out = Vec::new();
/// store.get(&mut out, "today").unwrap();
/// assert_eq!(out, b"page\nhome\nabout\n");
/// ```
pub struct Store<T> {
    /// Configuration, as given at construction
    options: Options,

    /// `<dir>/<name>`
    root: PathBuf,

    /// Remote storage; `None` for a purely local store
    backend: Option<Arc<dyn Backend>>,

    /// How data files are opened for writing
    opener: Arc<dyn FileOpener>,

    /// Which local files are stale
    expiry: ExpiryPolicy,

    /// Per-file read/write locks
    shards: Vec<RwLock<()>>,

    /// Held for the duration of a purge
    purge_lock: Mutex<()>,

    /// Held for the duration of an export
    export_lock: Mutex<()>,

    /// Background schedulers; empty until `start`
    jobs: Mutex<Vec<Scheduler>>,

    appended_rows: AtomicU64,
    downloads: AtomicU64,
    exports: AtomicU64,
    purged: AtomicU64,

    _entry: PhantomData<fn(&T)>,
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.options.name)
            .field("root", &self.root)
            .field("backend", &self.backend.is_some())
            .field("expiry", &self.expiry)
            .field("shards", &self.shards.len())
            .finish()
    }
}

impl<T: Entry> Store<T> {
    /// Creates a store without background jobs.
    ///
    /// Validates `options` and creates `<dir>/<name>/` if needed. Use
    /// [`Store::start`] (or [`Store::open`]) to also schedule purges and
    /// exports.
    pub fn new(options: Options, backend: Option<Arc<dyn Backend>>) -> Result<Self> {
        options.validate()?;

        let root = options.dir.join(&options.name);
        fs::create_dir_all(&root).map_err(|e| StoreError::io("create directory", &root, e))?;

        let expiry = ExpiryPolicy::from_options(&options);
        let shards = (0..NUM_SHARDS).map(|_| RwLock::new(())).collect();

        Ok(Self {
            options,
            root,
            backend,
            opener: Arc::new(OsFileOpener),
            expiry,
            shards,
            purge_lock: Mutex::new(()),
            export_lock: Mutex::new(()),
            jobs: Mutex::new(Vec::new()),
            appended_rows: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            exports: AtomicU64::new(0),
            purged: AtomicU64::new(0),
            _entry: PhantomData,
        })
    }

    /// Creates a store and starts its background jobs.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(options: Options, backend: Option<Arc<dyn Backend>>) -> Result<Arc<Self>>
    where
        T: 'static,
    {
        Ok(Self::new(options, backend)?.start())
    }

    /// Replaces the file opener used for appends and downloads.
    pub fn with_file_opener(mut self, opener: Arc<dyn FileOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Starts the purge job and, if a backend is configured, the export job.
    ///
    /// The jobs only hold a weak reference to the store: once the last `Arc`
    /// is dropped they stop. Must be called from within a Tokio runtime.
    pub fn start(self) -> Arc<Self>
    where
        T: 'static,
    {
        let store = Arc::new(self);
        let mut jobs = Vec::with_capacity(2);

        let weak = Arc::downgrade(&store);
        jobs.push(Scheduler::start(
            "purge",
            store.options.effective_purge_interval(),
            move || {
                if let Some(store) = weak.upgrade() {
                    store.purge_and_log();
                }
            },
        ));

        if store.backend.is_some() {
            let weak = Arc::downgrade(&store);
            jobs.push(Scheduler::start(
                "export",
                store.options.effective_export_interval(),
                move || {
                    if let Some(store) = weak.upgrade() {
                        store.backup_and_log();
                    }
                },
            ));
        }

        *lock(&store.jobs) = jobs;
        info!(store = %store.options.name, root = %store.root.display(), "Store opened");
        store
    }

    /// The store name.
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// The directory holding this store's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The options the store was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            appended_rows: self.appended_rows.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            exports: self.exports.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Copies the whole file of `key` into `dst`.
    ///
    /// If the key has no local file, it is downloaded from the backend first.
    ///
    /// # Returns
    ///
    /// The number of bytes copied.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntryNotFound`] if neither the local directory nor the backend has the key
    /// - [`StoreError::BackendNotSet`] if a download was needed but no backend is configured
    pub fn get<W>(&self, dst: &mut W, key: &str) -> Result<u64>
    where
        W: Write + ?Sized,
    {
        let name = self.file_name(key)?;
        self.with_file(&name, |file, path| {
            io::copy(file, &mut *dst).map_err(|e| StoreError::io("read", path, e))
        })
    }

    /// Writes the files of several keys into `dst` as one table.
    ///
    /// The header row comes from the first key that resolves; the header
    /// line of every later key is skipped. Keys that do not exist (or would
    /// need a missing backend) are skipped. Any other error stops the merge.
    ///
    /// An empty key list writes nothing.
    pub fn get_merged<W, I, K>(&self, dst: &mut W, keys: I) -> Result<()>
    where
        W: Write + ?Sized,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut header_written = false;

        for key in keys {
            let name = self.file_name(key.as_ref())?;
            let copied = self.with_file(&name, |file, path| {
                copy_rows(file, path, &mut *dst, !header_written)
            });

            match copied {
                Ok(_) => header_written = true,
                Err(e) if e.is_missing() => {
                    debug!(store = %self.options.name, key = key.as_ref(), "Skipping missing key in merge");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Resolves `name` to an open file and hands it to `read`, holding the shard lock throughout.
    fn with_file<R>(&self, name: &str, read: impl FnOnce(&mut File, &Path) -> Result<R>) -> Result<R> {
        let path = self.root.join(name);
        let shard = self.shard(name);

        // Fast path: the file is already here and only needs a read lock
        {
            let _guard = read_lock(shard);
            match File::open(&path) {
                Ok(mut file) => return read(&mut file, &path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io("open", &path, e)),
            }
        }

        // Miss - need the write lock so only one caller downloads
        let _guard = write_lock(shard);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            // Race: another thread may have downloaded it in between
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.download(name, &path)?,
            Err(e) => return Err(StoreError::io("open", &path, e)),
        };
        read(&mut file, &path)
    }

    /// Fetches `name` from the backend into a new local file. Caller holds the shard write lock.
    fn download(&self, name: &str, path: &Path) -> Result<File> {
        let backend = self.backend.as_ref().ok_or(StoreError::BackendNotSet)?;

        let mut file = self
            .opener
            .create(path)
            .map_err(|e| StoreError::io("create", path, e))?;

        match backend.import(&self.options.name, name, &mut file) {
            Ok(()) => {}
            Err(BackendError::NotFound) => {
                drop(file);
                if let Err(e) = fs::remove_file(path) {
                    warn!(store = %self.options.name, file = name, error = %e, "Failed to remove empty download");
                }
                return Err(StoreError::EntryNotFound);
            }
            Err(BackendError::Other(source)) => {
                return Err(StoreError::Backend {
                    op: "import",
                    name: name.to_string(),
                    source,
                });
            }
        }

        file.sync_all()
            .map_err(|e| StoreError::io("sync", path, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("rewind", path, e))?;

        // The local copy matches the backend, nothing to export yet
        self.set_last_exported(path)?;
        self.downloads.fetch_add(1, Ordering::Relaxed);
        debug!(store = %self.options.name, file = name, "Downloaded from backend");

        Ok(file)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Appends entries to the file of `key`, creating it (with a header row) if needed.
    ///
    /// Appending no entries does nothing, whatever the key.
    pub fn append(&self, key: &str, entries: &[T]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let name = self.file_name(key)?;

        let path = self.root.join(&name);
        let _guard = write_lock(self.shard(&name));

        let file = self
            .opener
            .open_append(&path)
            .map_err(|e| StoreError::io("open", &path, e))?;

        let written = write_entries(&file, &path, entries)?;
        self.appended_rows.fetch_add(written as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Reads the file of `key` and appends whatever `transform` returns, as one locked step.
    ///
    /// `transform` receives a [`Rows`] scanner over the current contents. No
    /// other writer can touch the key until the returned entries are
    /// appended. If `transform` fails, nothing is appended and its error is
    /// returned.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Append a running total
    /// store.append_with("totals", |rows| {
    ///     let mut sum = 0u64;
    ///     rows.for_each(|row| {
    ///         sum += row[1].parse::<u64>().map_err(anyhow::Error::from)?;
    ///         Ok(())
    ///     })?;
    ///     Ok(vec![Total::new("all", sum)])
    /// })?;
    /// ```
    pub fn append_with<F>(&self, key: &str, transform: F) -> Result<()>
    where
        F: FnOnce(&mut Rows<'_>) -> Result<Vec<T>>,
    {
        let name = self.file_name(key)?;
        let path = self.root.join(&name);
        let _guard = write_lock(self.shard(&name));

        let file = self
            .opener
            .open_append(&path)
            .map_err(|e| StoreError::io("open", &path, e))?;

        let mut rows = Rows::new(&file, &path);
        let entries = transform(&mut rows)?;

        if entries.is_empty() {
            // Do not leave behind a file this call created
            let len = file
                .metadata()
                .map_err(|e| StoreError::io("stat", &path, e))?
                .len();
            if len == 0 {
                drop(file);
                remove_if_exists(&path)?;
            }
            return Ok(());
        }

        let written = write_entries(&file, &path, &entries)?;
        self.appended_rows.fetch_add(written as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Removes the local file of `key`, along with its export marker.
    ///
    /// # Returns
    ///
    /// Returns `true` if a local file was removed, `false` if there was none.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let name = self.file_name(key)?;
        let path = self.root.join(&name);
        let _guard = write_lock(self.shard(&name));

        let removed = remove_if_exists(&path)?;
        remove_if_exists(&marker_path(&path))?;
        Ok(removed)
    }

    /// Stops the background jobs and runs one final export.
    ///
    /// Waits for an export that is already running to finish first, so the
    /// final export is never skipped. Without a backend there is nothing to
    /// export and this only stops the jobs.
    pub fn close(&self) -> Result<()> {
        let jobs = std::mem::take(&mut *lock(&self.jobs));
        for job in &jobs {
            job.stop();
        }
        drop(jobs);

        if self.backend.is_none() {
            return Ok(());
        }

        let _export = lock(&self.export_lock);
        let exported = self.export_all(&self.get_exportable()?)?;
        info!(store = %self.options.name, exported, "Store closed");
        Ok(())
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Exports every file changed since its last export.
    ///
    /// This is the export job's entry point.
    ///
    /// # Returns
    ///
    /// The number of files exported.
    ///
    /// # Errors
    ///
    /// [`StoreError::ExportIsActive`] if another export is still running.
    pub fn backup(&self) -> Result<usize> {
        let _export = try_lock(&self.export_lock).ok_or(StoreError::ExportIsActive)?;

        let exportable = self.get_exportable()?;
        self.export_all(&exportable)
    }

    /// Runs [`Store::backup`], logging instead of returning failures.
    fn backup_and_log(&self) {
        match self.backup() {
            Ok(0) => {}
            Ok(exported) => {
                debug!(store = %self.options.name, exported, "Export finished");
            }
            Err(StoreError::ExportIsActive) => {
                debug!(store = %self.options.name, "Export skipped, previous export still active");
            }
            Err(e) => {
                warn!(store = %self.options.name, error = %e, "Error exporting");
            }
        }
    }

    /// File names whose contents changed since they were last exported, sorted by name.
    fn get_exportable(&self) -> Result<Vec<String>> {
        let mut exportable = Vec::new();

        for (name, info) in self.list_files()? {
            let path = self.root.join(&name);
            let modified = info
                .modified()
                .map_err(|e| StoreError::io("stat", &path, e))?;

            let exported_since = self
                .last_exported(&path)
                .is_some_and(|exported| exported > modified);

            if !exported_since {
                exportable.push(name);
            }
        }

        Ok(exportable)
    }

    /// Exports `names` in order, stopping at the first failure.
    fn export_all(&self, names: &[String]) -> Result<usize> {
        let mut exported = 0;
        for name in names {
            if self.export(name)? {
                exported += 1;
            }
        }
        Ok(exported)
    }

    /// Uploads one file and refreshes its marker. Returns false if the file is gone.
    fn export(&self, name: &str) -> Result<bool> {
        let backend = self.backend.as_ref().ok_or(StoreError::BackendNotSet)?;
        let path = self.root.join(name);
        let _guard = read_lock(self.shard(name));

        let mut file = match File::open(&path) {
            Ok(file) => file,
            // Purged since it was listed
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io("open for export", &path, e)),
        };

        let stored = backend
            .export(&self.options.name, name, &mut file)
            .map_err(|e| StoreError::Backend {
                op: "export",
                name: name.to_string(),
                source: match e {
                    BackendError::NotFound => anyhow::anyhow!("backend reported object not found"),
                    BackendError::Other(source) => source,
                },
            })?;

        self.set_last_exported(&path)?;
        self.exports.fetch_add(1, Ordering::Relaxed);
        debug!(store = %self.options.name, file = name, stored = %stored, "Exported");

        Ok(true)
    }

    /// Creates or refreshes the export marker of `path`.
    ///
    /// Creating (or truncating) the marker lets the filesystem stamp its
    /// mtime with the same clock that stamps appends to the data file. An
    /// append in the same clock tick then leaves the file pending.
    fn set_last_exported(&self, path: &Path) -> Result<()> {
        let marker = marker_path(path);
        File::create(&marker).map_err(|e| StoreError::io("create marker", &marker, e))?;
        Ok(())
    }

    /// When `path` was last exported, if ever.
    fn last_exported(&self, path: &Path) -> Option<SystemTime> {
        let marker = marker_path(path);
        match fs::metadata(&marker).and_then(|info| info.modified()) {
            Ok(modified) => Some(modified),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(store = %self.options.name, marker = %marker.display(), error = %e, "Cannot read export marker");
                None
            }
        }
    }

    // ========================================================================
    // PURGE
    // ========================================================================

    /// Removes every local file the expiry policy considers stale.
    ///
    /// This is the purge job's entry point.
    ///
    /// # Returns
    ///
    /// The number of files removed.
    ///
    /// # Errors
    ///
    /// [`StoreError::PurgeIsActive`] if another purge is still running.
    pub fn purge(&self) -> Result<usize> {
        let _purge = try_lock(&self.purge_lock).ok_or(StoreError::PurgeIsActive)?;

        let expired = self.get_expired()?;
        self.remove_all(&expired)
    }

    /// Runs [`Store::purge`], logging instead of returning failures.
    fn purge_and_log(&self) {
        match self.purge() {
            Ok(0) => {}
            Ok(removed) => {
                debug!(store = %self.options.name, removed, "Purge finished");
            }
            Err(StoreError::PurgeIsActive) => {
                debug!(store = %self.options.name, "Purge skipped, previous purge still active");
            }
            Err(e) => {
                warn!(store = %self.options.name, error = %e, "Error purging");
            }
        }
    }

    /// File names the expiry policy considers stale, sorted by name.
    fn get_expired(&self) -> Result<Vec<String>> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(|(name, info)| self.expiry.is_expired(name, info))
            .map(|(name, _)| name)
            .collect())
    }

    /// Removes `names`, stopping at the first failure.
    ///
    /// Each file is checked again under its write lock, so a file written to
    /// after it was listed is kept.
    fn remove_all(&self, names: &[String]) -> Result<usize> {
        let mut removed = 0;

        for name in names {
            let path = self.root.join(name);
            let _guard = write_lock(self.shard(name));

            let info = match fs::metadata(&path) {
                Ok(info) => info,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io("stat", &path, e)),
            };
            if !self.expiry.is_expired(name, &info) {
                continue;
            }

            if remove_if_exists(&path)? {
                removed += 1;
            }
            remove_if_exists(&marker_path(&path))?;
        }

        self.purged.fetch_add(removed as u64, Ordering::Relaxed);
        Ok(removed)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Maps a key onto its file name: `<name>.<key>.csv`.
    fn file_name(&self, key: &str) -> Result<String> {
        if key.is_empty() || key.contains(['/', '\\', '\0']) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(format!("{}.{}.{}", self.options.name, key, DATA_EXTENSION))
    }

    /// Determines which shard guards a file.
    #[inline]
    fn shard(&self, name: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    /// Every data file of this store with its metadata, sorted by name.
    fn list_files(&self) -> Result<Vec<(String, Metadata)>> {
        let prefix = format!("{}.", self.options.name);
        let suffix = format!(".{}", DATA_EXTENSION);

        let entries =
            fs::read_dir(&self.root).map_err(|e| StoreError::io("list", &self.root, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("list", &self.root, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(&suffix) {
                continue;
            }

            let info = match entry.metadata() {
                Ok(info) => info,
                // Removed while listing
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io("stat", &entry.path(), e)),
            };
            if info.is_file() {
                files.push((name, info));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

/// Copies a data file into `dst`, optionally dropping its header record.
///
/// The header is skipped as a CSV record, so quoted header cells spanning
/// several lines are dropped whole.
fn copy_rows<W>(file: &mut File, path: &Path, dst: &mut W, with_header: bool) -> Result<u64>
where
    W: Write + ?Sized,
{
    if !with_header {
        let start = file
            .stream_position()
            .map_err(|e| StoreError::io("seek", path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(&mut *file);
        reader.headers().map_err(|e| StoreError::csv(path, e))?;
        let body = start + reader.position().byte();
        drop(reader);

        file.seek(SeekFrom::Start(body))
            .map_err(|e| StoreError::io("seek", path, e))?;
    }

    io::copy(file, dst).map_err(|e| StoreError::io("read", path, e))
}

fn marker_path(path: &Path) -> PathBuf {
    let mut marker = path.as_os_str().to_owned();
    marker.push(MARKER_SUFFIX);
    PathBuf::from(marker)
}

/// Removes `path`, returning whether it existed.
fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io("remove", path, e)),
    }
}

// The locks below guard `()`, the real state lives on disk, so a panic in
// another holder leaves nothing inconsistent behind and poisoning is ignored.

fn read_lock(shard: &RwLock<()>) -> RwLockReadGuard<'_, ()> {
    shard.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock(shard: &RwLock<()>) -> RwLockWriteGuard<'_, ()> {
    shard.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-flight acquire: `None` if someone else holds the lock.
fn try_lock(mutex: &Mutex<()>) -> Option<MutexGuard<'_, ()>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}
