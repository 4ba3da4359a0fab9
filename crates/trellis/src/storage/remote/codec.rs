//! Mapping between [`Issue`] and remote table rows.
//!
//! Absent or null columns decode to defaults: status Open, priority Medium,
//! empty text and labels, no assignee, `created_at` at the Unix epoch and
//! `updated_at` equal to `created_at`.
//!
//! `labels` travel as comma-joined text. Labels never contain a comma, so
//! this encoding is exact.
//!
//! `history` travels as text with one entry per line and tab-separated
//! `timestamp action field old new`; empty cells are `None`. Tabs and
//! newlines inside values are flattened to spaces, so this encoding is
//! lossy. A line that does not parse becomes an entry whose action is the
//! raw line. A JSON array is accepted too; a malformed element keeps its
//! action and is dated `created_at`.

use super::transport::Row;
use crate::domain::{
    normalize_assignee, normalize_labels, HistoryEntry, Issue, IssueId, IssueStatus, Priority,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Remote column names for each issue field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Id column
    pub id: String,
    /// Title column
    pub title: String,
    /// Description column
    pub description: String,
    /// Status column
    pub status: String,
    /// Priority column
    pub priority: String,
    /// Assignee column
    pub assignee: String,
    /// Comma-joined labels column
    pub labels: String,
    /// Creation timestamp column
    pub created_at: String,
    /// Update timestamp column
    pub updated_at: String,
    /// Line-delimited history column
    pub history: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            id: "Id".to_string(),
            title: "title".to_string(),
            description: "description".to_string(),
            status: "status".to_string(),
            priority: "priority".to_string(),
            assignee: "assignee".to_string(),
            labels: "labels".to_string(),
            created_at: "createdAt".to_string(),
            updated_at: "updatedAt".to_string(),
            history: "history".to_string(),
        }
    }
}

/// Why a row could not become an issue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The id column is missing or not a positive integer.
    #[error("row has no usable '{0}' column")]
    MissingId(String),

    /// The status text matches no board column.
    #[error("issue #{id} has unknown status '{status}'")]
    UnknownStatus {
        /// Id of the offending row
        id: IssueId,
        /// Raw status text
        status: String,
    },
}

impl ColumnMap {
    /// Encode an issue as a row. The id column is left out when `with_id`
    /// is false, letting the server assign one.
    pub fn encode(&self, issue: &Issue, with_id: bool) -> Row {
        let mut row = Row::new();
        if with_id {
            row.insert(self.id.clone(), Value::from(issue.id.get()));
        }
        row.insert(self.title.clone(), Value::from(issue.title.clone()));
        row.insert(
            self.description.clone(),
            Value::from(issue.description.clone()),
        );
        row.insert(self.status.clone(), Value::from(issue.status.label()));
        row.insert(self.priority.clone(), Value::from(issue.priority.label()));
        row.insert(
            self.assignee.clone(),
            issue.assignee.clone().map_or(Value::Null, Value::from),
        );
        row.insert(self.labels.clone(), Value::from(issue.labels.join(",")));
        row.insert(
            self.created_at.clone(),
            Value::from(format_timestamp(issue.created_at)),
        );
        row.insert(
            self.updated_at.clone(),
            Value::from(format_timestamp(issue.updated_at)),
        );
        row.insert(
            self.history.clone(),
            Value::from(encode_history(&issue.history)),
        );
        row
    }

    /// Decode a row into an issue.
    ///
    /// # Errors
    ///
    /// Fails when the id is unusable or the status is unknown; every other
    /// column falls back to its default.
    pub fn decode(&self, row: &Row) -> Result<Issue, DecodeError> {
        let id = row
            .get(&self.id)
            .and_then(value_as_id)
            .ok_or_else(|| DecodeError::MissingId(self.id.clone()))?;

        let status = match text(row, &self.status) {
            None => IssueStatus::default(),
            Some(raw) => IssueStatus::parse(&raw)
                .ok_or(DecodeError::UnknownStatus { id, status: raw })?,
        };

        let priority = match text(row, &self.priority) {
            None => Priority::default(),
            Some(raw) => Priority::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(issue_id = %id, priority = %raw, "Unknown priority, using Medium");
                Priority::default()
            }),
        };

        let created_at =
            timestamp(row, &self.created_at).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let updated_at = timestamp(row, &self.updated_at).unwrap_or(created_at);

        let history = match row.get(&self.history) {
            Some(Value::Array(items)) => decode_history_items(id, items, created_at),
            Some(Value::String(raw)) => decode_history(raw, created_at),
            _ => Vec::new(),
        };

        Ok(Issue {
            id,
            title: text(row, &self.title).unwrap_or_default(),
            description: text(row, &self.description).unwrap_or_default(),
            status,
            priority,
            assignee: normalize_assignee(text(row, &self.assignee)),
            labels: decode_labels(row.get(&self.labels)),
            created_at,
            updated_at,
            history,
        })
    }
}

/// Positive id from a number or numeric text.
pub(super) fn value_as_id(value: &Value) -> Option<IssueId> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id > 0).then_some(IssueId::new(id))
}

/// Text value of a column; `None` when absent or null.
fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn timestamp(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    let raw = text(row, column)?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_labels(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(joined)) => normalize_labels(joined.split(',')),
        Some(Value::Array(items)) => {
            normalize_labels(items.iter().filter_map(Value::as_str))
        }
        _ => Vec::new(),
    }
}

fn flatten(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Encode history entries as tab-separated lines.
pub fn encode_history(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            [
                format_timestamp(entry.timestamp),
                flatten(&entry.action),
                entry.field.as_deref().map(flatten).unwrap_or_default(),
                entry.old_value.as_deref().map(flatten).unwrap_or_default(),
                entry.new_value.as_deref().map(flatten).unwrap_or_default(),
            ]
            .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode history text. Unparseable lines are kept as plain actions dated
/// `fallback`.
pub fn decode_history(text: &str, fallback: DateTime<Utc>) -> Vec<HistoryEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_history_line(line).unwrap_or_else(|| HistoryEntry {
            timestamp: fallback,
            action: line.trim().to_string(),
            field: None,
            old_value: None,
            new_value: None,
        }))
        .collect()
}

/// Decode a JSON-array history entry by entry.
///
/// An entry that does not deserialize keeps its action, dated `fallback`;
/// one without an action is skipped.
fn decode_history_items(
    id: IssueId,
    items: &[Value],
    fallback: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            match serde_json::from_value::<HistoryEntry>(item.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let cell = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
                    let Some(action) = cell("action") else {
                        tracing::warn!(issue_id = %id, index, error = %e, "Skipping history entry");
                        return None;
                    };
                    tracing::warn!(issue_id = %id, index, error = %e, "Keeping malformed history entry");
                    Some(HistoryEntry {
                        timestamp: fallback,
                        action,
                        field: cell("field"),
                        old_value: cell("oldValue"),
                        new_value: cell("newValue"),
                    })
                }
            }
        })
        .collect()
}

fn parse_history_line(line: &str) -> Option<HistoryEntry> {
    let cells: Vec<&str> = line.split('\t').collect();
    let [timestamp, action, field, old_value, new_value] = cells[..] else {
        return None;
    };
    let timestamp = DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()?
        .with_timezone(&Utc);
    let cell = |value: &str| (!value.is_empty()).then(|| value.to_string());

    Some(HistoryEntry {
        timestamp,
        action: action.to_string(),
        field: cell(field),
        old_value: cell(old_value),
        new_value: cell(new_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewIssue;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn test_encode_decode_keeps_fields() {
        let columns = ColumnMap::default();
        let mut issue = NewIssue {
            title: "Login bug".to_string(),
            description: "Cannot log in".to_string(),
            status: IssueStatus::InProgress,
            priority: Priority::High,
            assignee: Some("Mike Chen".to_string()),
            labels: vec!["bug".to_string(), "security".to_string()],
        }
        .into_issue(IssueId::new(3), Utc::now());
        issue.history.push(HistoryEntry {
            timestamp: Utc::now(),
            action: "Status changed".to_string(),
            field: Some("status".to_string()),
            old_value: Some("Open".to_string()),
            new_value: Some("In Progress".to_string()),
        });

        let encoded = columns.encode(&issue, true);
        assert_eq!(encoded["labels"], json!("bug,security"));
        assert_eq!(encoded["status"], json!("In Progress"));

        let decoded = columns.decode(&encoded).unwrap();
        assert_eq!(decoded.title, issue.title);
        assert_eq!(decoded.status, issue.status);
        assert_eq!(decoded.labels, issue.labels);
        assert_eq!(decoded.history.len(), 2);
        assert_eq!(decoded.history[1].old_value.as_deref(), Some("Open"));
    }

    #[test]
    fn test_absent_columns_use_defaults() {
        let decoded = ColumnMap::default()
            .decode(&row(json!({"Id": "12", "title": "Bare"})))
            .unwrap();

        assert_eq!(decoded.id, IssueId::new(12));
        assert_eq!(decoded.status, IssueStatus::Open);
        assert_eq!(decoded.priority, Priority::Medium);
        assert_eq!(decoded.description, "");
        assert!(decoded.labels.is_empty());
        assert_eq!(decoded.assignee, None);
        assert_eq!(decoded.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(decoded.updated_at, decoded.created_at);
    }

    #[test]
    fn test_status_text_is_normalized() {
        let decoded = ColumnMap::default()
            .decode(&row(json!({"Id": 1, "status": "in_progress"})))
            .unwrap();
        assert_eq!(decoded.status, IssueStatus::InProgress);
    }

    #[test]
    fn test_unknown_status_and_missing_id_are_rejected() {
        let columns = ColumnMap::default();
        assert_eq!(
            columns.decode(&row(json!({"Id": 5, "status": "Blocked"}))),
            Err(DecodeError::UnknownStatus {
                id: IssueId::new(5),
                status: "Blocked".to_string()
            })
        );
        assert!(matches!(
            columns.decode(&row(json!({"title": "No id"}))),
            Err(DecodeError::MissingId(_))
        ));
    }

    #[test]
    fn test_unknown_priority_falls_back_to_medium() {
        let decoded = ColumnMap::default()
            .decode(&row(json!({"Id": 1, "priority": "Urgent"})))
            .unwrap();
        assert_eq!(decoded.priority, Priority::Medium);
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnMap {
            id: "issue_id".to_string(),
            title: "Name".to_string(),
            ..ColumnMap::default()
        };
        let decoded = columns
            .decode(&row(json!({"issue_id": 9, "Name": "Renamed"})))
            .unwrap();
        assert_eq!(decoded.title, "Renamed");
    }

    #[test]
    fn test_history_flattening_is_lossy() {
        let now = Utc::now();
        let entries = vec![HistoryEntry {
            timestamp: now,
            action: "Description\tchanged".to_string(),
            field: Some("description".to_string()),
            old_value: Some("line one\nline two".to_string()),
            new_value: None,
        }];

        let decoded = decode_history(&encode_history(&entries), now);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].action, "Description changed");
        assert_eq!(decoded[0].old_value.as_deref(), Some("line one line two"));
        assert_eq!(decoded[0].new_value, None);
    }

    #[test]
    fn test_malformed_history_array_entry_keeps_the_rest() {
        let decoded = ColumnMap::default()
            .decode(&row(json!({
                "Id": 3,
                "createdAt": "2025-01-10T08:20:00Z",
                "history": [
                    {"timestamp": "2025-01-10T08:20:00Z", "action": "Issue created"},
                    {"timestamp": null, "action": "Status changed", "field": "status",
                     "oldValue": "Open", "newValue": "Review"},
                    {"note": "no action"}
                ]
            })))
            .unwrap();

        assert_eq!(decoded.history.len(), 2);
        assert_eq!(decoded.history[0].action, "Issue created");
        assert_eq!(decoded.history[1].action, "Status changed");
        assert_eq!(decoded.history[1].timestamp, decoded.created_at);
        assert_eq!(decoded.history[1].new_value.as_deref(), Some("Review"));
    }

    #[test]
    fn test_unparseable_history_line_is_kept() {
        let fallback = DateTime::<Utc>::UNIX_EPOCH;
        let decoded = decode_history("Imported from tracker\n\n", fallback);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].action, "Imported from tracker");
        assert_eq!(decoded[0].timestamp, fallback);
    }
}
