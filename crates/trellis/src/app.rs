//! Application context for CLI command execution.
//!
//! [`App`] owns the store and the transition recorder for one session and
//! plays the role of the board controller: it loads and classifies the
//! board, turns detail-panel saves into recorded edits and handles drops.
//!
//! # Example
//!
//! ```no_run
//! use trellis::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("Using {}", app.describe());
//!     Ok(())
//! }
//! ```

use crate::board::{self, BoardState, MoveOutcome};
use crate::commands::init::{
    find_trellis_root, TrellisConfig, API_KEY_ENV, CONFIG_FILE_NAME, TRELLIS_DIR_NAME,
};
use crate::domain::{Issue, IssueId, NewIssue};
use crate::error::{ConfigError, Result};
use crate::filter::IssueFilter;
use crate::storage::{create_store, IssueStore};
use crate::transition::{IssueEdit, TransitionRecorder};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
pub struct App {
    /// The store (trait object so any backend fits)
    store: Box<dyn IssueStore>,

    /// Applies edits and records history
    recorder: TransitionRecorder,

    /// Path to the trellis directory, when loaded from disk
    trellis_dir: Option<PathBuf>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("trellis_dir", &self.trellis_dir)
            .field("recorder", &self.recorder)
            .field("store", &self.store.describe())
            .finish()
    }
}

impl App {
    /// Create an App around an existing store.
    pub fn new(store: Box<dyn IssueStore>, recorder: TransitionRecorder) -> Self {
        Self {
            store,
            recorder,
            trellis_dir: None,
        }
    }

    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for `.trellis/`, loads its config and
    /// builds the store. `TRELLIS_API_KEY` is read here, once.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No trellis repository is found in the directory tree
    /// - Configuration cannot be loaded or is invalid
    /// - The store cannot be created
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_trellis_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let trellis_dir = root_dir.join(TRELLIS_DIR_NAME);
        let config = TrellisConfig::load(&trellis_dir.join(CONFIG_FILE_NAME)).await?;

        let api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        let backend = config.to_backend(api_key)?;
        tracing::debug!(backend = backend.kind(), "Loaded configuration");

        let store = create_store(backend).await?;
        Ok(Self {
            store,
            recorder: config.recorder(),
            trellis_dir: Some(trellis_dir),
        })
    }

    /// Get a mutable reference to the store.
    pub fn store_mut(&mut self) -> &mut dyn IssueStore {
        self.store.as_mut()
    }

    /// Get an immutable reference to the store.
    pub fn store(&self) -> &dyn IssueStore {
        self.store.as_ref()
    }

    /// The transition recorder in use.
    pub fn recorder(&self) -> &TransitionRecorder {
        &self.recorder
    }

    /// Path to the trellis directory, if the app was loaded from one.
    pub fn trellis_dir(&self) -> Option<&Path> {
        self.trellis_dir.as_deref()
    }

    /// Backend description.
    pub fn describe(&self) -> String {
        self.store.describe()
    }

    /// Load the board.
    ///
    /// A store that cannot be read gives [`BoardState::Unavailable`] rather
    /// than an error; other errors propagate.
    pub async fn load_board(&self, filter: &IssueFilter) -> Result<BoardState> {
        match self.store.list().await {
            Ok(issues) => Ok(BoardState::classify(&issues, filter)),
            Err(e) if e.is_unavailable() => {
                tracing::warn!(error = %e, "Store unavailable, showing empty board");
                Ok(BoardState::Unavailable {
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Filtered issues, newest first.
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        Ok(filter.apply(&self.store.list().await?))
    }

    /// Fetch one issue.
    pub async fn get_issue(&self, id: IssueId) -> Result<Issue> {
        self.store.get(id).await
    }

    /// Create an issue.
    pub async fn create_issue(&mut self, draft: NewIssue) -> Result<Issue> {
        self.store.create(draft).await
    }

    /// Apply a detail-panel save and persist it.
    ///
    /// An empty edit list is a no-op that returns the stored issue.
    pub async fn save_edits(&mut self, id: IssueId, edits: Vec<IssueEdit>) -> Result<Issue> {
        let issue = self.store.get(id).await?;
        if edits.is_empty() {
            return Ok(issue);
        }
        let edited = self.recorder.apply_all(&issue, edits);
        self.store.update(id, edited).await
    }

    /// Drop an issue on a board column.
    pub async fn move_issue(&mut self, id: IssueId, column: &str) -> Result<MoveOutcome> {
        let issue = self.store.get(id).await?;
        board::move_issue(self.store.as_mut(), &self.recorder, &issue, column).await
    }

    /// Permanently delete an issue.
    pub async fn delete_issue(&mut self, id: IssueId) -> Result<()> {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::{self, BackendKind};
    use crate::domain::IssueStatus;
    use crate::storage::MockStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), BackendKind::Memory).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.describe(), "in-memory");
        assert!(app.trellis_dir().unwrap().ends_with(".trellis"));
        assert!(!app.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), BackendKind::Memory).await.unwrap();

        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert!(App::from_directory(&sub_dir).await.is_ok());
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a trellis repository"));
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_board() {
        let mock = MockStore::new();
        mock.fail_reads(true);
        let app = App::new(Box::new(mock), TransitionRecorder::default());

        let state = app.load_board(&IssueFilter::default()).await.unwrap();
        assert!(matches!(state, BoardState::Unavailable { .. }));
        assert!(app.list_issues(&IssueFilter::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_save_edits_records_status_only() {
        let mut app = App::new(Box::new(MockStore::new()), TransitionRecorder::default());
        let issue = app.create_issue(NewIssue::new("Login bug")).await.unwrap();

        let saved = app
            .save_edits(
                issue.id,
                vec![
                    IssueEdit::SetTitle("Login fails".to_string()),
                    IssueEdit::SetStatus(IssueStatus::InProgress),
                ],
            )
            .await
            .unwrap();

        assert_eq!(saved.title, "Login fails");
        assert_eq!(saved.status, IssueStatus::InProgress);
        assert_eq!(saved.history.len(), 2);
        assert_eq!(app.get_issue(issue.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_save_without_edits_writes_nothing() {
        let mock = MockStore::new();
        let mut app = App::new(Box::new(mock.clone()), TransitionRecorder::default());
        let issue = app.create_issue(NewIssue::new("Idle")).await.unwrap();

        let same = app.save_edits(issue.id, Vec::new()).await.unwrap();
        assert_eq!(same, issue);
        assert_eq!(mock.writes(), 1);
    }
}
