//! Storage Module
//!
//! This module provides the store itself: a directory of per-key CSV files
//! guarded by sharded locks, plus the background jobs that purge stale files
//! and export changed ones.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                 ▲                               ▲
//!                 │                               │
//!   ┌─────────────┴─────────────┐   ┌─────────────┴─────────────┐
//!   │   Purge Scheduler         │   │   Export Scheduler        │
//!   │  (ExpiryPolicy decides)   │   │  (only with a backend)    │
//!   └───────────────────────────┘   └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Locks**: 64 independent shards reduce contention between keys
//! - **Cache-Aside**: Missing keys are downloaded from the backend on first read
//! - **Expiry**: Stale local files are purged on a schedule
//! - **Export Markers**: Only files changed since their last export are uploaded
//!
//! ## Example
//!
//! ```
//! use csvdb::storage::{Options, Store};
//! use csvdb::Entry;
//! use std::time::Duration;
//!
//! struct Reading(f64);
//!
//! impl Entry for Reading {
//!     fn keys(&self) -> Vec<String> {
//!         vec!["celsius".into()]
//!     }
//!
//!     fn values(&self) -> Vec<String> {
//!         vec![self.0.to_string()]
//!     }
//! }
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let options = Options::new("sensors", dir.path()).with_file_ttl(Duration::from_secs(3600));
//! let store: Store<Reading> = Store::new(options, None).unwrap();
//!
//! store.append("kitchen", &[Reading(21.5)]).unwrap();
//!
//! let mut out = Vec::new();
//! store.get(&mut out, "kitchen").unwrap();
//! assert_eq!(out, b"celsius\n21.5\n");
//! ```

pub mod engine;
pub mod expiry;
pub mod fs;
pub mod options;
pub mod scheduler;

// Re-export commonly used types
pub use engine::{Store, StoreStats};
pub use expiry::{ExpiryMonitor, ExpiryPolicy};
pub use fs::{FileOpener, OsFileOpener};
pub use options::{Options, DEFAULT_EXPORT_INTERVAL, DEFAULT_PURGE_INTERVAL};
pub use scheduler::Scheduler;
