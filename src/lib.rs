//! # csvdb - A Local Append-Only CSV Store
//!
//! csvdb keeps one append-only CSV file per key in a local directory and
//! treats that directory as a cache in front of a remote object store.
//! Reads of a key that is not on disk download it first; writes stay local
//! until a background job exports them.
//!
//! ## Features
//!
//! - **Append-Only Files**: Each key is a CSV file with a header row written once
//! - **Cache-Aside Reads**: Missing keys are imported from the backend on demand
//! - **Periodic Purge**: Stale local files are removed by an expiry policy
//! - **Periodic Export**: Files changed since their last export are uploaded
//! - **Single-Flight Jobs**: Overlapping purge or export runs are rejected, not queued
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               csvdb                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Caller    │───>│                   Store                      │   │
//! │  │ append/get  │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  └─────────────┘    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │  ┌─────────────┐    │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │  │ CSV Codec   │<──>│       <dir>/<name>/<name>.<key>.csv          │   │
//! │  │ (Rows)      │    └───────────────┬──────────────────▲───────────┘   │
//! │  └─────────────┘                    │ export           │ import        │
//! │                                     ▼                  │               │
//! │  ┌──────────────────────┐   ┌──────────────────────────┴────────────┐  │
//! │  │ Purge / Export       │   │              Backend                  │  │
//! │  │ Schedulers (Tokio)   │   │        (remote object store)          │  │
//! │  └──────────────────────┘   └───────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use csvdb::{Backend, Entry, MemoryBackend, Options, Store};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Click {
//!     url: String,
//! }
//!
//! impl Entry for Click {
//!     fn keys(&self) -> Vec<String> {
//!         vec!["url".into()]
//!     }
//!
//!     fn values(&self) -> Vec<String> {
//!         vec![self.url.clone()]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> csvdb::Result<()> {
//!     let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
//!
//!     let options = Options::new("clicks", "./data")
//!         .with_file_ttl(Duration::from_secs(24 * 60 * 60))
//!         .with_export_interval(Duration::from_secs(60));
//!
//!     // Starts the purge and export schedulers
//!     let store = Store::open(options, Some(backend))?;
//!
//!     store.append("2024-01-01", &[Click { url: "/".into() }])?;
//!
//!     let mut out = Vec::new();
//!     store.get(&mut out, "2024-01-01")?;
//!
//!     // Stops the schedulers and exports whatever changed
//!     store.close()
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The store, its options, expiry policy and schedulers
//! - [`codec`]: The [`Entry`] contract and CSV row reading/writing
//! - [`backend`]: The remote storage contract and an in-memory implementation
//! - [`error`]: Error types
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! Files are guarded by 64 sharded `RwLock`s, keyed by file name. Readers of
//! a key share its lock; appends, deletes and downloads take it exclusively.
//!
//! ### Logging
//!
//! The store logs through `tracing`. Background jobs cannot return errors to
//! anyone, so their failures are logged at `warn` level; install a subscriber
//! to see them.

pub mod backend;
pub mod codec;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use backend::{Backend, BackendError, MemoryBackend};
pub use codec::{Entry, Rows};
pub use error::{OptionsError, Result, StoreError};
pub use storage::{ExpiryMonitor, ExpiryPolicy, Options, Scheduler, Store, StoreStats};

/// Version of csvdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
