//! In-memory storage backend.
//!
//! All data lives in RAM and is **lost when the process exits**. The store
//! can start empty or seeded with the built-in fixture issues, which makes
//! it the default backend for demos and the backend used by most tests.
//!
//! # Ids
//!
//! New ids come from a high-water mark: 1 + the highest id this store has
//! ever held. Deleting the newest issue therefore never causes its id to be
//! handed out again.
//!
//! # Thread Safety
//!
//! [`InMemoryStore`] is a cheap clonable handle around
//! `Arc<Mutex<InMemoryStoreInner>>`. Every operation takes the async lock,
//! so independent tasks can share one store.

mod fixture;
mod inner;
mod trait_impl;

use crate::domain::Issue;
use crate::error::Result;
use crate::storage::IssueStore;
use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use fixture::fixture_issues;

/// Thread-safe in-memory store.
///
/// Clones share the same collection.
#[derive(Clone)]
pub struct InMemoryStore(Arc<Mutex<InMemoryStoreInner>>);

impl InMemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::from_issues(Vec::new())
    }

    /// A store holding `issues`.
    ///
    /// Issues are ordered newest first. A repeated id keeps its first
    /// occurrence and the rest are dropped with a warning.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self(Arc::new(Mutex::new(InMemoryStoreInner::from_issues(issues))))
    }

    /// A store seeded with the built-in fixture issues.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the embedded fixture is malformed.
    pub fn seeded() -> Result<Self> {
        Ok(Self::from_issues(fixture_issues()?))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new, empty in-memory store.
///
/// # Example
///
/// ```
/// use trellis::storage::in_memory::new_in_memory_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store();
///     assert!(store.list().await.unwrap().is_empty());
/// }
/// ```
pub fn new_in_memory_store() -> Box<dyn IssueStore> {
    Box::new(InMemoryStore::new())
}

/// Create an in-memory store seeded with the fixture issues.
///
/// # Errors
///
/// Returns `Error::Json` if the embedded fixture is malformed.
pub fn seeded_in_memory_store() -> Result<Box<dyn IssueStore>> {
    let store = InMemoryStore::seeded()?;
    tracing::debug!("Seeded in-memory store from fixture");
    Ok(Box::new(store))
}
