//! Transition recording for issue edits.
//!
//! Every mutation of an issue goes through [`TransitionRecorder::apply`]:
//! an [`IssueEdit`] names the field and its new value, and the recorder
//! returns a new [`Issue`] with the field replaced, `updated_at` refreshed
//! and, for tracked fields, one [`HistoryEntry`] appended. The recorder
//! never talks to a store; callers persist the result with
//! [`IssueStore::update`](crate::storage::IssueStore::update).
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use trellis::domain::{IssueId, IssueStatus, NewIssue};
//! use trellis::transition::{IssueEdit, TransitionRecorder};
//!
//! let issue = NewIssue::new("Login bug").into_issue(IssueId::new(1), Utc::now());
//! let moved = TransitionRecorder::default().apply(&issue, IssueEdit::SetStatus(IssueStatus::Review));
//!
//! assert_eq!(moved.status, IssueStatus::Review);
//! assert_eq!(moved.history.len(), issue.history.len() + 1);
//! ```

use crate::domain::{
    normalize_assignee, normalize_labels, HistoryEntry, Issue, IssueStatus, Priority,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An editable field of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// The title
    Title,
    /// The description
    Description,
    /// The workflow status
    Status,
    /// The priority
    Priority,
    /// The assignee
    Assignee,
    /// The label set
    Labels,
}

impl Field {
    /// Field name as stored in history entries, e.g. "status"
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Status => "status",
            Field::Priority => "priority",
            Field::Assignee => "assignee",
            Field::Labels => "labels",
        }
    }

    /// History action for a change of this field, e.g. "Status changed"
    pub fn action(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} changed", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed edit to an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueEdit {
    /// Replace the title
    SetTitle(String),
    /// Replace the description
    SetDescription(String),
    /// Move the issue to another workflow status
    SetStatus(IssueStatus),
    /// Change the priority
    SetPriority(Priority),
    /// Assign the issue, or unassign it with `None`
    SetAssignee(Option<String>),
    /// Replace the label set
    SetLabels(Vec<String>),
}

impl IssueEdit {
    /// The field this edit changes.
    pub fn field(&self) -> Field {
        match self {
            IssueEdit::SetTitle(_) => Field::Title,
            IssueEdit::SetDescription(_) => Field::Description,
            IssueEdit::SetStatus(_) => Field::Status,
            IssueEdit::SetPriority(_) => Field::Priority,
            IssueEdit::SetAssignee(_) => Field::Assignee,
            IssueEdit::SetLabels(_) => Field::Labels,
        }
    }
}

/// Render a field's current value the way history entries store it.
fn field_value(issue: &Issue, field: Field) -> Option<String> {
    match field {
        Field::Title => Some(issue.title.clone()),
        Field::Description => Some(issue.description.clone()),
        Field::Status => Some(issue.status.label().to_string()),
        Field::Priority => Some(issue.priority.label().to_string()),
        Field::Assignee => issue.assignee.clone(),
        Field::Labels => Some(issue.labels.join(", ")),
    }
}

/// Replace the edited field in place.
fn reduce(issue: &mut Issue, edit: IssueEdit) {
    match edit {
        IssueEdit::SetTitle(title) => issue.title = title,
        IssueEdit::SetDescription(description) => issue.description = description,
        IssueEdit::SetStatus(status) => issue.status = status,
        IssueEdit::SetPriority(priority) => issue.priority = priority,
        IssueEdit::SetAssignee(assignee) => issue.assignee = normalize_assignee(assignee),
        IssueEdit::SetLabels(labels) => issue.labels = normalize_labels(labels),
    }
}

/// Pick the timestamp for a mutation of a record last touched at `previous`.
///
/// Wall clocks can repeat or step back; the result is always strictly
/// later than `previous`.
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Applies [`IssueEdit`]s and records history for tracked fields.
///
/// `status` is always tracked. Other fields can be added, which makes
/// edit-save of the detail panel leave a trail for them too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecorder {
    tracked: Vec<Field>,
}

impl Default for TransitionRecorder {
    fn default() -> Self {
        Self {
            tracked: vec![Field::Status],
        }
    }
}

impl TransitionRecorder {
    /// Create a recorder tracking the given fields in addition to `status`.
    pub fn new(tracked: impl IntoIterator<Item = Field>) -> Self {
        let mut recorder = Self::default();
        for field in tracked {
            if !recorder.tracked.contains(&field) {
                recorder.tracked.push(field);
            }
        }
        recorder
    }

    /// Fields that get a history entry when edited.
    pub fn tracked_fields(&self) -> &[Field] {
        &self.tracked
    }

    /// Whether edits of `field` are recorded in the history.
    pub fn is_tracked(&self, field: Field) -> bool {
        self.tracked.contains(&field)
    }

    /// Apply one edit using the current time.
    pub fn apply(&self, issue: &Issue, edit: IssueEdit) -> Issue {
        self.apply_at(issue, edit, Utc::now())
    }

    /// Apply one edit as of `now`.
    ///
    /// An edit that sets a field to its current value is still applied and,
    /// for tracked fields, still recorded.
    pub fn apply_at(&self, issue: &Issue, edit: IssueEdit, now: DateTime<Utc>) -> Issue {
        self.apply_all_at(issue, [edit], now)
    }

    /// Apply several edits as one save, using the current time.
    pub fn apply_all(&self, issue: &Issue, edits: impl IntoIterator<Item = IssueEdit>) -> Issue {
        self.apply_all_at(issue, edits, Utc::now())
    }

    /// Apply several edits as one save as of `now`.
    ///
    /// All entries appended by the save share one timestamp, which is also
    /// the new `updated_at`.
    pub fn apply_all_at(
        &self,
        issue: &Issue,
        edits: impl IntoIterator<Item = IssueEdit>,
        now: DateTime<Utc>,
    ) -> Issue {
        let timestamp = next_timestamp(issue.updated_at, now);
        let mut updated = issue.clone();

        for edit in edits {
            let field = edit.field();
            let old_value = field_value(&updated, field);
            reduce(&mut updated, edit);

            if self.is_tracked(field) {
                let new_value = field_value(&updated, field);
                tracing::debug!(
                    issue_id = %updated.id,
                    field = field.name(),
                    old = ?old_value,
                    new = ?new_value,
                    "Recording transition"
                );
                updated.history.push(HistoryEntry {
                    timestamp,
                    action: field.action(),
                    field: Some(field.name().to_string()),
                    old_value,
                    new_value,
                });
            }
        }

        updated.updated_at = timestamp;
        updated
    }
}

/// Apply one edit with the default recorder (only `status` is tracked).
pub fn apply_field_change(issue: &Issue, edit: IssueEdit) -> Issue {
    TransitionRecorder::default().apply(issue, edit)
}
