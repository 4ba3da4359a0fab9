//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time.

use crate::domain::{IssueId, IssueStatus, MAX_TITLE_LENGTH};

/// Validate an issue title: non-blank, at most [`MAX_TITLE_LENGTH`]
/// characters after trimming.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let len = s.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters (got {len})"
        ));
    }

    Ok(s.to_string())
}

/// Validate an issue id. Accepts `12` and `#12`.
pub fn validate_issue_id(s: &str) -> Result<IssueId, String> {
    if s.trim().is_empty() {
        return Err("Issue ID cannot be empty".to_string());
    }
    s.parse::<IssueId>().map_err(|e| e.to_string())
}

/// Validate a board column and return its column id.
///
/// Accepts column ids (`in-progress`) and display labels (`In Progress`).
pub fn validate_column(s: &str) -> Result<String, String> {
    IssueStatus::parse(s)
        .map(|status| status.column_id().to_string())
        .ok_or_else(|| {
            let known: Vec<&str> = IssueStatus::ALL.iter().map(|s| s.column_id()).collect();
            format!("Unknown column '{s}'. Expected one of: {}", known.join(", "))
        })
}
