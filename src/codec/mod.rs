//! Row Codec
//!
//! This module defines how caller records become rows on disk.
//!
//! ## Modules
//!
//! - `entry`: The [`Entry`] trait every appendable record implements
//! - `rows`: The row writer and the [`Rows`] scanner

pub mod entry;
pub mod rows;

pub use entry::Entry;
pub use rows::Rows;
