//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Info:     blue    (open status)
//!   - Active:   yellow  (in progress, high priority)
//!   - Review:   magenta (review status, labels)
//!   - Success:  green   (closed status, completed actions)
//!   - Error:    red     (critical priority, failures)
//!   - Muted:    dimmed  (field labels, low priority)

use crate::domain::{IssueStatus, Priority};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply color to a status label.
pub(crate) fn colorize_status(status: IssueStatus, config: &OutputConfig) -> String {
    let text = status.label();
    if !config.use_colors {
        return text.to_string();
    }
    match status {
        IssueStatus::Open => text.blue().to_string(),
        IssueStatus::InProgress => text.yellow().to_string(),
        IssueStatus::Review => text.magenta().to_string(),
        IssueStatus::Closed => text.green().to_string(),
    }
}

/// Apply color to a priority label.
pub(crate) fn colorize_priority(priority: Priority, config: &OutputConfig) -> String {
    let text = priority.label();
    if !config.use_colors {
        return text.to_string();
    }
    match priority {
        Priority::Critical => text.red().bold().to_string(),
        Priority::High => text.yellow().to_string(),
        Priority::Medium => text.to_string(),
        Priority::Low => text.dimmed().to_string(),
    }
}

/// Colorize an issue id as `#12` (cyan).
pub(crate) fn colorize_id(id: impl std::fmt::Display, config: &OutputConfig) -> String {
    let text = format!("#{id}");
    if !config.use_colors {
        return text;
    }
    text.cyan().to_string()
}

/// Colorize labels (magenta).
pub(crate) fn colorize_labels(labels: &[String], config: &OutputConfig) -> String {
    let text = labels.join(", ");
    if !config.use_colors || text.is_empty() {
        return text;
    }
    text.magenta().to_string()
}

/// Status icon, with ASCII fallback.
pub(crate) fn status_icon(status: IssueStatus, config: &OutputConfig) -> &'static str {
    if config.use_ascii {
        match status {
            IssueStatus::Open => "o",
            IssueStatus::InProgress => ">",
            IssueStatus::Review => "?",
            IssueStatus::Closed => "+",
        }
    } else {
        match status {
            IssueStatus::Open => "○",
            IssueStatus::InProgress => "◔",
            IssueStatus::Review => "◉",
            IssueStatus::Closed => "✓",
        }
    }
}

/// Colored status icon.
pub(crate) fn colored_status_icon(status: IssueStatus, config: &OutputConfig) -> String {
    let icon = status_icon(status, config);
    if !config.use_colors {
        return icon.to_string();
    }
    match status {
        IssueStatus::Open => icon.blue().to_string(),
        IssueStatus::InProgress => icon.yellow().to_string(),
        IssueStatus::Review => icon.magenta().to_string(),
        IssueStatus::Closed => icon.green().to_string(),
    }
}

/// Priority arrow, with ASCII fallback.
pub(crate) fn priority_icon(priority: Priority, config: &OutputConfig) -> &'static str {
    if config.use_ascii {
        match priority {
            Priority::Critical => "!!",
            Priority::High => "^",
            Priority::Medium => "-",
            Priority::Low => "v",
        }
    } else {
        match priority {
            Priority::Critical => "⚠",
            Priority::High => "↑",
            Priority::Medium => "−",
            Priority::Low => "↓",
        }
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
