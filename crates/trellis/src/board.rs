//! Board projection and drag-and-drop moves.
//!
//! [`Board::project`] groups issues into the four fixed columns. Counts are
//! derived from the grouped issues on every projection.
//! [`move_issue`] is the drop handler: dropping an issue on its own column
//! does nothing, any other column records a status change and persists it.

use crate::domain::{Issue, IssueStatus};
use crate::error::{Error, Result};
use crate::filter::IssueFilter;
use crate::storage::IssueStore;
use crate::transition::{IssueEdit, TransitionRecorder};
use serde::Serialize;

/// One board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Status shown in this column
    pub status: IssueStatus,

    /// Issues in the column, in projection input order
    pub issues: Vec<Issue>,
}

impl Column {
    /// Column id, e.g. `in-progress`.
    pub fn id(&self) -> &'static str {
        self.status.column_id()
    }

    /// Display title, e.g. `In Progress`.
    pub fn title(&self) -> &'static str {
        self.status.label()
    }

    /// Number of issues in the column.
    pub fn count(&self) -> usize {
        self.issues.len()
    }

    /// Whether the column has no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Issues grouped into the fixed column order Open, In Progress, Review,
/// Closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    columns: Vec<Column>,
}

impl Board {
    /// Group issues by status.
    pub fn project(issues: &[Issue]) -> Self {
        let columns = IssueStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                issues: issues
                    .iter()
                    .filter(|issue| issue.status == status)
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    /// Columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column for `status`.
    pub fn column(&self, status: IssueStatus) -> Option<&Column> {
        self.columns.iter().find(|column| column.status == status)
    }

    /// Total number of issues on the board.
    pub fn total(&self) -> usize {
        self.columns.iter().map(Column::count).sum()
    }
}

/// What the board view should show after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardState {
    /// The store could not be read; offer a retry.
    Unavailable {
        /// Error text to show
        error: String,
    },

    /// The store holds no issues at all.
    NoIssues,

    /// Issues exist but none pass the active filter.
    NoMatches {
        /// Number of issues before filtering
        total: usize,
    },

    /// At least one issue to show.
    Ready(Board),
}

impl BoardState {
    /// Classify a loaded, unfiltered issue list against a filter.
    pub fn classify(issues: &[Issue], filter: &IssueFilter) -> Self {
        if issues.is_empty() {
            return BoardState::NoIssues;
        }
        let visible = filter.apply(issues);
        if visible.is_empty() {
            return BoardState::NoMatches {
                total: issues.len(),
            };
        }
        BoardState::Ready(Board::project(&visible))
    }

    /// The board, if there is one to show.
    pub fn board(&self) -> Option<&Board> {
        match self {
            BoardState::Ready(board) => Some(board),
            _ => None,
        }
    }
}

/// Result of dropping an issue on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped on its own column; nothing was recorded or stored.
    Unchanged,

    /// Status changed and persisted; holds the stored issue.
    Moved(Issue),
}

/// Resolve the status a drop on `column` asks for.
///
/// `column` may be a column id (`in-progress`) or a display label
/// (`In Progress`). Returns `None` when the issue already sits there.
///
/// # Errors
///
/// Returns `Error::ValidationFailed` for an unknown column.
pub fn plan_move(issue: &Issue, column: &str) -> Result<Option<IssueStatus>> {
    let target = IssueStatus::parse(column)
        .ok_or_else(|| Error::ValidationFailed(format!("Unknown column '{column}'")))?;
    Ok((target != issue.status).then_some(target))
}

/// Handle a drop of `issue` on `column`.
///
/// A real move goes through the recorder and then `update` on the store.
///
/// # Errors
///
/// Returns `ValidationFailed` for an unknown column and whatever the store
/// returns for the update.
pub async fn move_issue(
    store: &mut dyn IssueStore,
    recorder: &TransitionRecorder,
    issue: &Issue,
    column: &str,
) -> Result<MoveOutcome> {
    let Some(target) = plan_move(issue, column)? else {
        tracing::debug!(issue_id = %issue.id, column, "Dropped on own column");
        return Ok(MoveOutcome::Unchanged);
    };

    let moved = recorder.apply(issue, IssueEdit::SetStatus(target));
    let stored = store.update(issue.id, moved).await?;

    tracing::info!(
        issue_id = %issue.id,
        from = %issue.status,
        to = %stored.status,
        "Moved issue"
    );
    Ok(MoveOutcome::Moved(stored))
}
