//! Output formatting for CLI commands.
//!
//! Every printer has a text form for people and a JSON form for scripts.
//! Text printers write to a generic [`Write`] so they can be tested against
//! a buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)

pub mod color;

use crate::board::{Board, BoardState};
use crate::domain::{HistoryEntry, Issue};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{
    bold, colored_status_icon, colorize_id, colorize_labels, colorize_priority, colorize_status,
    dimmed, priority_icon,
};

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from the process environment.
    ///
    /// Reads:
    /// - `TRELLIS_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `TRELLIS_ASCII`: "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: any value disables colors
    /// - `TRELLIS_COLOR`: "0" or "false" disables colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`OutputConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("TRELLIS_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "TRELLIS_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("TRELLIS_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "TRELLIS_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("TRELLIS_COLOR").is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_WIDTH, false, true)
    }
}

fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(usize::from(DEFAULT_TERMINAL_WIDTH), |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print a list of issues in the specified format
pub fn print_issues(issues: &[Issue], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_issues_text(&mut handle, issues, &config),
        OutputMode::Json => write_json(&mut handle, issues),
    }
}

/// Print an issue with full details and its activity history
pub fn print_issue_details(issue: &Issue, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_issue_details_text(&mut handle, issue, &config),
        OutputMode::Json => write_json(&mut handle, issue),
    }
}

/// Print the board, or the empty state that replaces it
pub fn print_board_state(state: &BoardState, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_board_state_text(&mut handle, state, &config),
        OutputMode::Json => write_json(&mut handle, &board_state_json(state)),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn board_state_json(state: &BoardState) -> serde_json::Value {
    match state {
        BoardState::Unavailable { error } => json!({ "state": "unavailable", "error": error }),
        BoardState::NoIssues => json!({ "state": "empty" }),
        BoardState::NoMatches { total } => json!({ "state": "no_matches", "total": total }),
        BoardState::Ready(board) => json!({
            "state": "ready",
            "total": board.total(),
            "columns": board.columns().iter().map(|column| json!({
                "id": column.id(),
                "title": column.title(),
                "count": column.count(),
                "issues": column.issues,
            })).collect::<Vec<_>>(),
        }),
    }
}

fn print_issue_line<W: Write>(w: &mut W, issue: &Issue, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {}  {} {}  {}",
        colored_status_icon(issue.status, config),
        colorize_id(issue.id, config),
        priority_icon(issue.priority, config),
        colorize_priority(issue.priority, config),
        issue.title
    )
}

fn print_issues_text<W: Write>(
    w: &mut W,
    issues: &[Issue],
    config: &OutputConfig,
) -> io::Result<()> {
    if issues.is_empty() {
        writeln!(w, "No issues found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} issue(s):", issues.len())?;
    writeln!(w)?;
    for issue in issues {
        print_issue_line(w, issue, config)?;
    }
    Ok(())
}

fn print_issue_details_text<W: Write>(
    w: &mut W,
    issue: &Issue,
    config: &OutputConfig,
) -> io::Result<()> {
    let content_width = get_terminal_width().min(config.max_width);

    writeln!(
        w,
        "{} {}: {}",
        colored_status_icon(issue.status, config),
        colorize_id(issue.id, config),
        issue.title
    )?;
    writeln!(
        w,
        "{}  {}    {}  {} {}",
        dimmed("Status:", config),
        colorize_status(issue.status, config),
        dimmed("Priority:", config),
        priority_icon(issue.priority, config),
        colorize_priority(issue.priority, config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Assignee:", config),
        issue.assignee.as_deref().unwrap_or("Unassigned")
    )?;
    if !issue.labels.is_empty() {
        writeln!(
            w,
            "{} {}",
            dimmed("Labels:", config),
            colorize_labels(&issue.labels, config)
        )?;
    }
    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Created:", config),
        issue.created_at.format("%Y-%m-%d %H:%M"),
        dimmed("Updated:", config),
        issue.updated_at.format("%Y-%m-%d %H:%M")
    )?;

    print_text_section(w, "Description", &issue.description, content_width, config)?;
    print_history(w, &issue.history, config)
}

/// Activity history, oldest first.
fn print_history<W: Write>(
    w: &mut W,
    history: &[HistoryEntry],
    config: &OutputConfig,
) -> io::Result<()> {
    if history.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{} ({}):", bold("Activity", config), history.len())?;
    for entry in history {
        writeln!(
            w,
            "  {}  {entry}",
            dimmed(&entry.timestamp.format("%Y-%m-%d %H:%M").to_string(), config)
        )?;
    }
    Ok(())
}

fn print_text_section<W: Write>(
    w: &mut W,
    title: &str,
    content: &str,
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{}:", bold(title, config))?;
    for line in wrap_text(content, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    Ok(())
}

fn print_board_state_text<W: Write>(
    w: &mut W,
    state: &BoardState,
    config: &OutputConfig,
) -> io::Result<()> {
    match state {
        BoardState::Unavailable { error: detail } => {
            writeln!(w, "{}", error("Could not load issues", config))?;
            writeln!(w, "  {detail}")?;
            writeln!(w, "  Run the command again to retry.")
        }
        BoardState::NoIssues => {
            writeln!(w, "{}", bold("No Issues Found", config))?;
            writeln!(
                w,
                "  Get started by creating your first issue with 'trellis create'."
            )
        }
        BoardState::NoMatches { total } => {
            writeln!(w, "{}", bold("No Matching Issues", config))?;
            writeln!(
                w,
                "  No issues match your current filters. Try adjusting your search criteria or clearing some filters."
            )?;
            writeln!(w, "  {}", dimmed(&format!("{total} issue(s) hidden"), config))
        }
        BoardState::Ready(board) => print_board_text(w, board, config),
    }
}

fn print_board_text<W: Write>(w: &mut W, board: &Board, config: &OutputConfig) -> io::Result<()> {
    for (index, column) in board.columns().iter().enumerate() {
        if index > 0 {
            writeln!(w)?;
        }
        writeln!(
            w,
            "{} {} ({})",
            colored_status_icon(column.status, config),
            bold(column.title(), config),
            column.count()
        )?;
        if column.is_empty() {
            let empty = format!("No issues in {}", column.title().to_lowercase());
            writeln!(w, "  {}", dimmed(&empty, config))?;
            continue;
        }
        for issue in &column.issues {
            write!(w, "  ")?;
            print_issue_line(w, issue, config)?;
            if let Some(assignee) = &issue.assignee {
                writeln!(w, "      {} {assignee}", dimmed("Assignee:", config))?;
            }
            if !issue.labels.is_empty() {
                writeln!(
                    w,
                    "      {} {}",
                    dimmed("Labels:", config),
                    colorize_labels(&issue.labels, config)
                )?;
            }
        }
    }
    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueId, IssueStatus, NewIssue, Priority};
    use crate::filter::IssueFilter;
    use crate::transition::{IssueEdit, TransitionRecorder};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, true, false)
    }

    fn test_issue() -> Issue {
        NewIssue {
            title: "Login bug".to_string(),
            description: "Users cannot sign in with SSO".to_string(),
            priority: Priority::High,
            assignee: Some("Sarah Johnson".to_string()),
            labels: vec!["bug".to_string(), "security".to_string()],
            ..NewIssue::default()
        }
        .into_issue(
            IssueId::new(4),
            Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap(),
        )
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_output_config_from_lookup() {
        let config = OutputConfig::from_lookup(lookup(&[
            ("TRELLIS_MAX_WIDTH", "120"),
            ("TRELLIS_ASCII", "1"),
        ]));
        assert_eq!(config, OutputConfig::new(120, true, true));

        let config = OutputConfig::from_lookup(lookup(&[
            ("TRELLIS_MAX_WIDTH", "wide"),
            ("TRELLIS_ASCII", "maybe"),
        ]));
        assert_eq!(config, OutputConfig::default());

        assert!(!OutputConfig::from_lookup(lookup(&[("NO_COLOR", "")])).use_colors);
        assert!(!OutputConfig::from_lookup(lookup(&[("TRELLIS_COLOR", "false")])).use_colors);
        assert!(OutputConfig::from_lookup(lookup(&[("TRELLIS_COLOR", "1")])).use_colors);
    }

    #[test]
    fn test_print_issues_text() {
        let output = render(|w| print_issues_text(w, &[test_issue()], &plain()));
        assert!(output.contains("Found 1 issue"));
        assert!(output.contains("#4"));
        assert!(output.contains("High"));
        assert!(output.contains("Login bug"));

        let empty = render(|w| print_issues_text(w, &[], &plain()));
        assert_eq!(empty, "No issues found.\n");
    }

    #[test]
    fn test_print_issue_details_shows_history() {
        let issue = TransitionRecorder::default().apply(
            &test_issue(),
            IssueEdit::SetStatus(IssueStatus::Review),
        );
        let output = render(|w| print_issue_details_text(w, &issue, &plain()));

        assert!(output.contains("#4: Login bug"));
        assert!(output.contains("Sarah Johnson"));
        assert!(output.contains("bug, security"));
        assert!(output.contains("Description:"));
        assert!(output.contains("Activity (2):"));
        assert!(output.contains("Issue created"));
        assert!(output.contains("from Open to Review"));
    }

    #[test]
    fn test_unassigned_issue_details() {
        let mut issue = test_issue();
        issue.assignee = None;
        issue.description = String::new();
        let output = render(|w| print_issue_details_text(w, &issue, &plain()));

        assert!(output.contains("Assignee: Unassigned"));
        assert!(!output.contains("Description:"));
    }

    #[test]
    fn test_board_empty_states() {
        let no_issues = render(|w| print_board_state_text(w, &BoardState::NoIssues, &plain()));
        assert!(no_issues.contains("No Issues Found"));

        let no_matches = render(|w| {
            print_board_state_text(w, &BoardState::NoMatches { total: 3 }, &plain())
        });
        assert!(no_matches.contains("No Matching Issues"));
        assert!(no_matches.contains("3 issue(s) hidden"));

        let unavailable = render(|w| {
            print_board_state_text(
                w,
                &BoardState::Unavailable {
                    error: "connection refused".to_string(),
                },
                &plain(),
            )
        });
        assert!(unavailable.contains("connection refused"));
        assert!(unavailable.contains("retry"));
    }

    #[test]
    fn test_board_columns_and_empty_column_text() {
        let state = BoardState::classify(&[test_issue()], &IssueFilter::default());
        let output = render(|w| print_board_state_text(w, &state, &plain()));

        assert!(output.contains("Open (1)"));
        assert!(output.contains("In Progress (0)"));
        assert!(output.contains("No issues in in progress"));
        assert!(output.contains("No issues in closed"));
        assert!(output.contains("Login bug"));
    }

    #[test]
    fn test_board_state_json() {
        let state = BoardState::classify(&[test_issue()], &IssueFilter::default());
        let value = board_state_json(&state);

        assert_eq!(value["state"], "ready");
        assert_eq!(value["total"], 1);
        assert_eq!(value["columns"][0]["id"], "open");
        assert_eq!(value["columns"][0]["count"], 1);
        assert_eq!(value["columns"][0]["issues"][0]["status"], "Open");
        assert_eq!(value["columns"][3]["title"], "Closed");

        assert_eq!(board_state_json(&BoardState::NoIssues)["state"], "empty");
    }

    #[test]
    fn test_wrap_text() {
        let text = "Check out https://example.com/very/long/path/to/resource for details";
        for line in wrap_text(text, 30) {
            assert!(line.len() <= 30, "Line too long: '{line}'");
        }
        assert_eq!(wrap_text("Line one\nLine two\nLine three", 50).len(), 3);
        assert_eq!(wrap_text("Short", 100), vec!["Short".to_string()]);
    }
}
