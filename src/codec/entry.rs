//! The Entry Contract
//!
//! An entry is any caller-owned record that can be laid out as one row of a
//! key's file. The store never inspects entries beyond two calls:
//!
//! - [`Entry::keys`]: the column names, written once as the header row when a
//!   key's file is first created.
//! - [`Entry::values`]: the cells of the entry, written as one value row on
//!   every append.
//!
//! ## Example
//!
//! ```
//! use csvdb::Entry;
//!
//! struct Visit {
//!     page: String,
//!     hits: u64,
//! }
//!
//! impl Entry for Visit {
//!     fn keys(&self) -> Vec<String> {
//!         vec!["page".into(), "hits".into()]
//!     }
//!
//!     fn values(&self) -> Vec<String> {
//!         vec![self.page.clone(), self.hits.to_string()]
//!     }
//! }
//! ```

/// A record that can be appended to a key's file.
///
/// `keys()` and `values()` must return the same number of cells, in the same
/// order. All entries appended under one key are expected to share the same
/// `keys()`; the store writes the header from the first entry only and does
/// not check the others.
pub trait Entry {
    /// Column names, used for the header row.
    fn keys(&self) -> Vec<String>;

    /// Cell values, one per column.
    fn values(&self) -> Vec<String>;
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestEntry {
    pub foo: String,
    pub bar: String,
}

#[cfg(test)]
impl TestEntry {
    pub fn new(foo: &str, bar: &str) -> Self {
        Self {
            foo: foo.to_string(),
            bar: bar.to_string(),
        }
    }

    /// The three entries most tests append: `1,1b` `2,2b` `3,3b`.
    pub fn sample() -> Vec<Self> {
        vec![
            Self::new("1", "1b"),
            Self::new("2", "2b"),
            Self::new("3", "3b"),
        ]
    }
}

#[cfg(test)]
impl Entry for TestEntry {
    fn keys(&self) -> Vec<String> {
        vec!["foo".to_string(), "bar".to_string()]
    }

    fn values(&self) -> Vec<String> {
        vec![self.foo.clone(), self.bar.clone()]
    }
}
