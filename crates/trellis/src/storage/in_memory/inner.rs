//! Core in-memory storage data structures.
//!
//! Wrapped in `Arc<Mutex<>>` by [`InMemoryStore`](super::InMemoryStore).

use crate::domain::{normalize_assignee, normalize_labels, Issue, IssueId};
use crate::error::{Error, Result};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Inner storage structure (not thread-safe).
pub(crate) struct InMemoryStoreInner {
    /// Issues ordered by `created_at` descending, then id descending
    pub(super) issues: Vec<Issue>,

    /// Highest id ever held by this store
    pub(super) last_id: u64,
}

impl InMemoryStoreInner {
    pub(crate) fn from_issues(issues: Vec<Issue>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(issues.len());

        for mut issue in issues {
            if !seen.insert(issue.id) {
                tracing::warn!(issue_id = %issue.id, "Dropping issue with duplicate id");
                continue;
            }
            issue.assignee = normalize_assignee(issue.assignee.take());
            issue.labels = normalize_labels(std::mem::take(&mut issue.labels));
            kept.push(issue);
        }

        let last_id = kept.iter().map(|issue| issue.id.get()).max().unwrap_or(0);
        let mut inner = Self {
            issues: kept,
            last_id,
        };
        inner.sort();
        inner
    }

    /// Reserve the next id.
    pub(super) fn next_id(&mut self) -> IssueId {
        self.last_id += 1;
        IssueId::new(self.last_id)
    }

    pub(super) fn position(&self, id: IssueId) -> Result<usize> {
        self.issues
            .iter()
            .position(|issue| issue.id == id)
            .ok_or(Error::NotFound(id))
    }

    /// Insert keeping the newest-first order.
    pub(super) fn insert(&mut self, issue: Issue) {
        let key = sort_key(&issue);
        let at = self
            .issues
            .partition_point(|existing| sort_key(existing) < key);
        self.issues.insert(at, issue);
    }

    pub(super) fn sort(&mut self) {
        self.issues.sort_by_key(sort_key);
    }
}

fn sort_key(issue: &Issue) -> (Reverse<chrono::DateTime<chrono::Utc>>, Reverse<IssueId>) {
    (Reverse(issue.created_at), Reverse(issue.id))
}
