//! Storage abstraction layer for trellis.
//!
//! This module provides the core store trait and the factory for creating
//! backends. Two implementations exist:
//!
//! - **In-memory**: a process-local, ordered collection, optionally seeded
//!   from the built-in fixture. Lost when the process exits.
//! - **Remote**: a tabular records API reached over HTTP, with issue fields
//!   mapped to configurable column names.
//!
//! # Architecture
//!
//! The trait is async and object-safe, so consumers hold a
//! `Box<dyn IssueStore>` and never know which backend they talk to.
//! Backend choice and credentials are passed in through [`StoreBackend`]
//! when the store is built.
//!
//! # Test Utilities
//!
//! A [`MockStore`] that counts calls and can simulate an unreachable
//! backend is available with the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! trellis = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use trellis::domain::NewIssue;
//! use trellis::storage::{create_store, StoreBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = create_store(StoreBackend::InMemory { seed: false }).await?;
//!
//!     let issue = store.create(NewIssue::new("Login bug")).await?;
//!     println!("Created issue {}", issue.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{Issue, IssueId, NewIssue};
use crate::error::{Error, Result};
use async_trait::async_trait;

pub mod in_memory;
pub mod remote;

pub use remote::{RemoteConfig, RemoteStore};

/// Core storage trait for issue management.
///
/// Implementations must be `Send + Sync`. Mutating methods take
/// `&mut self`; the store assumes a single writer per session and
/// last-write-wins semantics.
///
/// # Errors
///
/// - `NotFound`: no issue has the requested id
/// - `ValidationFailed`: a draft was rejected before reaching the backend
/// - `StoreUnavailable`: the backend could not be reached or reported failure
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All issues, newest first (ties: higher id first).
    async fn list(&self) -> Result<Vec<Issue>>;

    /// Fetch a single issue.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no issue has that id.
    async fn get(&self, id: IssueId) -> Result<Issue>;

    /// Create an issue from a draft.
    ///
    /// Assigns the id and both timestamps and seeds the history with a
    /// single "Issue created" entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationFailed` if the title is blank or too long.
    async fn create(&mut self, draft: NewIssue) -> Result<Issue>;

    /// Create several issues, each independently.
    ///
    /// Fails as a whole only when no draft succeeded. Backends that can send
    /// a batch in one request override this.
    async fn create_many(&mut self, drafts: Vec<NewIssue>) -> Result<BatchResult> {
        let mut result = BatchResult::default();
        for (index, draft) in drafts.into_iter().enumerate() {
            match self.create(draft).await {
                Ok(issue) => result.created.push(issue),
                Err(error) => result.failed.push(BatchError { index, error }),
            }
        }
        result.into_result()
    }

    /// Replace the stored record at `id`.
    ///
    /// The stored `id` is forced to the argument and `updated_at` is
    /// refreshed. History is stored as given.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the issue doesn't exist; the collection
    /// is left untouched.
    async fn update(&mut self, id: IssueId, record: Issue) -> Result<Issue>;

    /// Permanently remove an issue.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the issue doesn't exist.
    async fn delete(&mut self, id: IssueId) -> Result<()>;

    /// Short human-readable description of the backend, e.g. "in-memory".
    fn describe(&self) -> String;
}

/// Outcome of [`IssueStore::create_many`].
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Issues that were created, in input order
    pub created: Vec<Issue>,

    /// Drafts that failed, with their position in the input
    pub failed: Vec<BatchError>,
}

/// A single failed draft in a batch.
#[derive(Debug)]
pub struct BatchError {
    /// Index of the draft in the submitted batch
    pub index: usize,

    /// Why it failed
    pub error: Error,
}

impl BatchResult {
    /// Whether every draft was created.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn a batch where nothing succeeded into its first error.
    ///
    /// # Errors
    ///
    /// Returns the first failure when no draft was created.
    pub fn into_result(mut self) -> Result<Self> {
        if self.created.is_empty() && !self.failed.is_empty() {
            self.failed.sort_by_key(|failure| failure.index);
            return Err(self.failed.swap_remove(0).error);
        }
        Ok(self)
    }
}

/// Pick the `updated_at` value for a record being stored by `update`.
pub(crate) fn stored_updated_at(record: &Issue) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
        .max(record.updated_at)
        .max(record.created_at)
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store.
    InMemory {
        /// Start with the built-in fixture issues
        seed: bool,
    },

    /// Remote records API.
    Remote(RemoteConfig),
}

impl StoreBackend {
    /// Short name used in config files and output.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::InMemory { .. } => "memory",
            StoreBackend::Remote(_) => "remote",
        }
    }
}

/// Create a store for the given backend.
///
/// # Errors
///
/// Returns an error if the fixture cannot be decoded or the HTTP client
/// cannot be built.
pub async fn create_store(backend: StoreBackend) -> Result<Box<dyn IssueStore>> {
    match backend {
        StoreBackend::InMemory { seed: false } => Ok(in_memory::new_in_memory_store()),
        StoreBackend::InMemory { seed: true } => in_memory::seeded_in_memory_store(),
        StoreBackend::Remote(config) => {
            tracing::debug!(base_url = %config.base_url, table = %config.table, "Connecting remote store");
            Ok(Box::new(RemoteStore::connect(config)?))
        }
    }
}

// ========== Test Utilities ==========

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockStore;

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use super::{in_memory, IssueStore};
    use crate::domain::{Issue, IssueId, NewIssue};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counting store for tests.
    ///
    /// Delegates to a real in-memory store, counts reads and writes, and can
    /// be switched to answer every read or write with
    /// `Error::StoreUnavailable`. Clones share counters, switches and data,
    /// so a test can keep a handle after boxing one copy.
    #[derive(Clone)]
    pub struct MockStore {
        inner: in_memory::InMemoryStore,
        reads: Arc<AtomicUsize>,
        writes: Arc<AtomicUsize>,
        fail_reads: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
    }

    impl MockStore {
        /// An empty mock store.
        pub fn new() -> Self {
            Self::with_issues(Vec::new())
        }

        /// A mock store holding `issues`.
        pub fn with_issues(issues: Vec<Issue>) -> Self {
            Self {
                inner: in_memory::InMemoryStore::from_issues(issues),
                reads: Arc::default(),
                writes: Arc::default(),
                fail_reads: Arc::default(),
                fail_writes: Arc::default(),
            }
        }

        /// Number of read calls (`list`, `get`) so far.
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        /// Number of write calls (`create`, `update`, `delete`) so far.
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Make reads fail with `StoreUnavailable`.
        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        /// Make writes fail with `StoreUnavailable`.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn read(&self) -> Result<()> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::StoreUnavailable("mock read failure".to_string()));
            }
            Ok(())
        }

        fn write(&self) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::StoreUnavailable("mock write failure".to_string()));
            }
            Ok(())
        }
    }

    impl Default for MockStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl IssueStore for MockStore {
        async fn list(&self) -> Result<Vec<Issue>> {
            self.read()?;
            self.inner.list().await
        }

        async fn get(&self, id: IssueId) -> Result<Issue> {
            self.read()?;
            self.inner.get(id).await
        }

        async fn create(&mut self, draft: NewIssue) -> Result<Issue> {
            self.write()?;
            self.inner.create(draft).await
        }

        async fn update(&mut self, id: IssueId, record: Issue) -> Result<Issue> {
            self.write()?;
            self.inner.update(id, record).await
        }

        async fn delete(&mut self, id: IssueId) -> Result<()> {
            self.write()?;
            self.inner.delete(id).await
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }
}
