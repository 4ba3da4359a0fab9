//! Filter engine for the board and list views.
//!
//! An [`IssueFilter`] has four dimensions: free-text search, priority set,
//! assignee set and label set. An empty dimension places no constraint.
//! A filter matches when every dimension matches (AND); within a set
//! dimension any selected value is enough (OR).

use crate::domain::{Issue, Priority};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Composite filter over issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueFilter {
    /// Case-insensitive text searched in title, description and id
    pub search_text: String,

    /// Selected priorities
    pub priority: Vec<Priority>,

    /// Selected assignees, compared exactly
    pub assignee: Vec<String>,

    /// Selected labels, compared case-insensitively
    pub labels: Vec<String>,
}

impl IssueFilter {
    /// A filter with only the search text set.
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: text.into(),
            ..Self::default()
        }
    }

    /// Add selected priorities parsed from text such as `"high"`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationFailed` for an unknown priority.
    pub fn with_priority_names<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let priority: Priority = name.as_ref().parse()?;
            if !self.priority.contains(&priority) {
                self.priority.push(priority);
            }
        }
        Ok(self)
    }

    /// Whether any of the priority, assignee or label sets is non-empty.
    ///
    /// The search text is not counted, matching the sidebar's notion of
    /// "active filters".
    pub fn has_active_filters(&self) -> bool {
        !self.priority.is_empty() || !self.assignee.is_empty() || !self.labels.is_empty()
    }

    /// Whether the filter constrains nothing at all.
    pub fn is_unconstrained(&self) -> bool {
        !self.has_active_filters() && self.search_text.trim().is_empty()
    }

    /// Clear the set dimensions and keep the search text.
    pub fn clear_dimensions(&mut self) {
        self.priority.clear();
        self.assignee.clear();
        self.labels.clear();
    }

    /// Check a single issue against the filter.
    pub fn matches(&self, issue: &Issue) -> bool {
        self.matches_search(issue)
            && self.matches_priority(issue)
            && self.matches_assignee(issue)
            && self.matches_labels(issue)
    }

    /// Keep the issues that match, in their original order.
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        issues
            .iter()
            .filter(|issue| self.matches(issue))
            .cloned()
            .collect()
    }

    fn matches_search(&self, issue: &Issue) -> bool {
        let needle = self.search_text.trim();
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        issue.title.to_lowercase().contains(&needle)
            || issue.description.to_lowercase().contains(&needle)
            || issue.id.to_string().contains(&needle)
    }

    fn matches_priority(&self, issue: &Issue) -> bool {
        self.priority.is_empty() || self.priority.contains(&issue.priority)
    }

    fn matches_assignee(&self, issue: &Issue) -> bool {
        if self.assignee.is_empty() {
            return true;
        }
        issue
            .assignee
            .as_ref()
            .is_some_and(|assignee| self.assignee.contains(assignee))
    }

    fn matches_labels(&self, issue: &Issue) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        self.labels.iter().any(|wanted| {
            let wanted = wanted.to_lowercase();
            issue.labels.iter().any(|label| label.to_lowercase() == wanted)
        })
    }
}

/// Check a single issue against a filter.
pub fn matches(issue: &Issue, filter: &IssueFilter) -> bool {
    filter.matches(issue)
}

/// Keep the issues that match `filter`, preserving input order.
pub fn apply_filters(issues: &[Issue], filter: &IssueFilter) -> Vec<Issue> {
    filter.apply(issues)
}
