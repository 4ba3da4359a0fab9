//! Domain types for issue tracking.
//!
//! This module contains the issue record, its workflow status and priority
//! enums, and the history entries appended as an issue moves across the board.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for issue titles
pub const MAX_TITLE_LENGTH: usize = 200;

/// Action recorded in the seed history entry of every new issue
pub const CREATED_ACTION: &str = "Issue created";

/// People offered when assigning an issue.
///
/// Assignees are free text; this list only feeds pickers and completions.
pub const ASSIGNEE_SUGGESTIONS: [&str; 4] =
    ["John Smith", "Sarah Johnson", "Mike Chen", "Emily Davis"];

/// Labels offered when creating an issue
pub const LABEL_SUGGESTIONS: [&str; 7] = [
    "frontend",
    "backend",
    "ui/ux",
    "performance",
    "security",
    "bug",
    "feature",
];

/// Unique identifier for an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub u64);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The numeric value of the ID
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for IssueId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for IssueId {
    type Err = Error;

    /// Parses `12` or `#12`.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::ValidationFailed(format!("'{s}' is not a valid issue id")))
    }
}

/// Workflow status of an issue.
///
/// Each status is also a board column. [`IssueStatus::label`] gives the
/// display form ("In Progress") and [`IssueStatus::column_id`] the column
/// form ("in-progress"); [`IssueStatus::parse`] accepts either.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum IssueStatus {
    /// Issue is open and ready to work on
    #[default]
    #[serde(alias = "open")]
    Open,

    /// Issue is currently being worked on
    #[serde(rename = "In Progress", alias = "in-progress", alias = "in_progress")]
    InProgress,

    /// Work is done and waiting for review
    #[serde(alias = "review")]
    Review,

    /// Issue has been completed
    #[serde(alias = "closed")]
    Closed,
}

/// The single mapping between statuses, their display labels and column ids.
const STATUS_TABLE: [(IssueStatus, &str, &str); 4] = [
    (IssueStatus::Open, "Open", "open"),
    (IssueStatus::InProgress, "In Progress", "in-progress"),
    (IssueStatus::Review, "Review", "review"),
    (IssueStatus::Closed, "Closed", "closed"),
];

/// Normalize a status label or column id into column-id form.
///
/// Lower-cases and turns spaces and underscores into hyphens, so
/// `"In Progress"`, `"in_progress"` and `"in-progress"` all become
/// `"in-progress"`.
pub fn normalize_status(text: &str) -> String {
    text.trim()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl IssueStatus {
    /// All statuses in board column order
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Review,
        IssueStatus::Closed,
    ];

    fn entry(self) -> (IssueStatus, &'static str, &'static str) {
        // Every variant has a row in STATUS_TABLE, in declaration order.
        STATUS_TABLE[self as usize]
    }

    /// Display label, e.g. "In Progress"
    pub fn label(self) -> &'static str {
        self.entry().1
    }

    /// Board column id, e.g. "in-progress"
    pub fn column_id(self) -> &'static str {
        self.entry().2
    }

    /// Look up a status by exact column id.
    pub fn from_column_id(id: &str) -> Option<Self> {
        STATUS_TABLE
            .iter()
            .find(|(_, _, column)| *column == id)
            .map(|(status, _, _)| *status)
    }

    /// Parse a display label or column id in any casing.
    pub fn parse(text: &str) -> Option<Self> {
        Self::from_column_id(&normalize_status(text))
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IssueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::ValidationFailed(format!(
                "unknown status '{s}'. Valid values: Open, In Progress, Review, Closed"
            ))
        })
    }
}

/// Priority of an issue, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    /// Nice to have
    #[serde(alias = "low")]
    Low,

    /// Default priority
    #[default]
    #[serde(alias = "medium")]
    Medium,

    /// Should be picked up soon
    #[serde(alias = "high")]
    High,

    /// Drop everything
    #[serde(alias = "critical")]
    Critical,
}

impl Priority {
    /// All priorities from highest to lowest, the order filter pickers use
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Display label, e.g. "High"
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    /// Case-folded key used by filters, e.g. "high"
    pub fn key(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Parse a priority in any casing.
    pub fn parse(text: &str) -> Option<Self> {
        let folded = text.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.key() == folded)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::ValidationFailed(format!(
                "unknown priority '{s}'. Valid values: Low, Medium, High, Critical"
            ))
        })
    }
}

/// One entry of an issue's activity history.
///
/// `field`, `old_value` and `new_value` are `None` for entries that do not
/// describe a field change, such as [`CREATED_ACTION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// When the change happened
    pub timestamp: DateTime<Utc>,

    /// Human-readable action, e.g. "Status changed"
    pub action: String,

    /// Name of the changed field
    #[serde(default)]
    pub field: Option<String>,

    /// Value before the change
    #[serde(default)]
    pub old_value: Option<String>,

    /// Value after the change
    #[serde(default)]
    pub new_value: Option<String>,
}

impl HistoryEntry {
    /// The seed entry every new issue starts with.
    pub fn created(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            action: CREATED_ACTION.to_string(),
            field: None,
            old_value: None,
            new_value: None,
        }
    }

    /// Whether this entry records a change of `field`.
    pub fn is_change_of(&self, field: &str) -> bool {
        self.field.as_deref() == Some(field)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action)?;
        if let Some(field) = &self.field {
            write!(
                f,
                " ({}) from {} to {}",
                field,
                self.old_value.as_deref().unwrap_or("(none)"),
                self.new_value.as_deref().unwrap_or("(none)")
            )?;
        }
        Ok(())
    }
}

/// Represents an issue on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier for the issue
    pub id: IssueId,

    /// Issue title
    pub title: String,

    /// Issue description (empty when none was given)
    #[serde(default)]
    pub description: String,

    /// Current workflow status
    #[serde(default)]
    pub status: IssueStatus,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// Assignee (optional)
    #[serde(default)]
    pub assignee: Option<String>,

    /// Labels, in display order
    #[serde(default)]
    pub labels: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Append-only activity log, oldest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Issue {
    /// Check whether the issue carries a label, ignoring case.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// Data for creating a new issue.
///
/// The store assigns the id, both timestamps and the seed history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    /// Issue title (required)
    pub title: String,

    /// Issue description
    #[serde(default)]
    pub description: String,

    /// Initial status, normally Open
    #[serde(default)]
    pub status: IssueStatus,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// Assignee (optional)
    #[serde(default)]
    pub assignee: Option<String>,

    /// Labels
    #[serde(default)]
    pub labels: Vec<String>,
}

impl NewIssue {
    /// Start a draft with the given title and every other field defaulted.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationFailed` if the title is blank or longer
    /// than [`MAX_TITLE_LENGTH`].
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::ValidationFailed("Title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::ValidationFailed(format!(
                "Title cannot exceed {MAX_TITLE_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Build the persisted issue for this draft.
    ///
    /// Trims the title, drops a blank assignee, normalizes labels and seeds
    /// the history with a single [`CREATED_ACTION`] entry.
    pub fn into_issue(self, id: IssueId, now: DateTime<Utc>) -> Issue {
        Issue {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            status: self.status,
            priority: self.priority,
            assignee: normalize_assignee(self.assignee),
            labels: normalize_labels(self.labels),
            created_at: now,
            updated_at: now,
            history: vec![HistoryEntry::created(now)],
        }
    }
}

/// Treat a blank assignee as unassigned.
pub fn normalize_assignee(assignee: Option<String>) -> Option<String> {
    assignee
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

/// Trim labels, drop blank ones and drop case-insensitive duplicates.
///
/// A label never contains a comma: `"ui,ux"` becomes the two labels `ui`
/// and `ux`. The first spelling of each label wins and display order is
/// kept.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for raw in labels {
        for label in raw.as_ref().split(',').map(str::trim) {
            if label.is_empty() || normalized.iter().any(|l| l.eq_ignore_ascii_case(label)) {
                continue;
            }
            normalized.push(label.to_string());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::label("In Progress", "in-progress")]
    #[case::column("in-progress", "in-progress")]
    #[case::snake("in_progress", "in-progress")]
    #[case::shouting("  REVIEW ", "review")]
    #[case::double_space("In  Progress", "in-progress")]
    fn test_normalize_status(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_status(input), expected);
    }

    #[test]
    fn test_status_table_is_bidirectional() {
        for status in IssueStatus::ALL {
            assert_eq!(IssueStatus::from_column_id(status.column_id()), Some(status));
            assert_eq!(IssueStatus::parse(status.label()), Some(status));
        }
        assert_eq!(IssueStatus::parse("blocked"), None);
        assert_eq!(IssueStatus::from_column_id("In Progress"), None);
    }

    #[test]
    fn test_status_serde_uses_labels() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: IssueStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(parsed, IssueStatus::InProgress);
    }

    #[test]
    fn test_priority_parse_and_order() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
        assert!(Priority::Critical > Priority::High);
        assert_eq!(Priority::default(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[rstest]
    #[case::plain("42", 42)]
    #[case::hash("#42", 42)]
    #[case::padded(" 7 ", 7)]
    fn test_issue_id_parse(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(input.parse::<IssueId>().unwrap(), IssueId::new(expected));
    }

    #[test]
    fn test_issue_id_parse_rejects_text() {
        let err = "abc".parse::<IssueId>().unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
    }

    #[test]
    fn test_normalize_labels() {
        let labels = normalize_labels(["bug", " ", "Bug", "frontend ", ""]);
        assert_eq!(labels, vec!["bug".to_string(), "frontend".to_string()]);
    }

    #[test]
    fn test_normalize_labels_splits_on_commas() {
        let labels = normalize_labels(["ui,ux", " api , UI", ","]);
        assert_eq!(labels, vec!["ui", "ux", "api"]);
    }

    #[test]
    fn test_new_issue_validate() {
        assert!(NewIssue::new("Fix login").validate().is_ok());
        assert!(matches!(
            NewIssue::new("   ").validate(),
            Err(Error::ValidationFailed(_))
        ));
        assert!(NewIssue::new("x".repeat(MAX_TITLE_LENGTH + 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_into_issue_seeds_history() {
        let now = Utc::now();
        let draft = NewIssue {
            title: "  Login bug ".to_string(),
            assignee: Some(String::new()),
            labels: vec!["bug".into(), "bug".into()],
            ..NewIssue::default()
        };
        let issue = draft.into_issue(IssueId::new(3), now);
        assert_eq!(issue.title, "Login bug");
        assert_eq!(issue.assignee, None);
        assert_eq!(issue.labels, vec!["bug".to_string()]);
        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(issue.history, vec![HistoryEntry::created(now)]);
        assert_eq!(issue.created_at, issue.updated_at);
    }

    #[test]
    fn test_history_entry_display() {
        let now = Utc::now();
        assert_eq!(HistoryEntry::created(now).to_string(), "Issue created");
        let entry = HistoryEntry {
            timestamp: now,
            action: "Status changed".into(),
            field: Some("status".into()),
            old_value: Some("Open".into()),
            new_value: Some("Review".into()),
        };
        assert_eq!(
            entry.to_string(),
            "Status changed (status) from Open to Review"
        );
        assert!(entry.is_change_of("status"));
    }

    #[test]
    fn test_issue_json_shape() {
        let issue = NewIssue::new("Dark mode").into_issue(IssueId::new(2), Utc::now());
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["status"], "Open");
        assert_eq!(value["priority"], "Medium");
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["history"][0]["action"], CREATED_ACTION);
        assert!(value["history"][0]["field"].is_null());
    }
}
