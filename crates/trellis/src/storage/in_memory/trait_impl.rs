//! IssueStore trait implementation for in-memory storage.

use super::InMemoryStore;
use crate::domain::{Issue, IssueId, NewIssue};
use crate::error::Result;
use crate::storage::{stored_updated_at, IssueStore};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl IssueStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Issue>> {
        let inner = self.0.lock().await;
        Ok(inner.issues.clone())
    }

    async fn get(&self, id: IssueId) -> Result<Issue> {
        let inner = self.0.lock().await;
        let at = inner.position(id)?;
        Ok(inner.issues[at].clone())
    }

    async fn create(&mut self, draft: NewIssue) -> Result<Issue> {
        draft.validate()?;

        let mut inner = self.0.lock().await;
        let id = inner.next_id();
        let issue = draft.into_issue(id, Utc::now());
        inner.insert(issue.clone());

        tracing::info!(issue_id = %id, "Created issue");
        Ok(issue)
    }

    async fn update(&mut self, id: IssueId, mut record: Issue) -> Result<Issue> {
        let mut inner = self.0.lock().await;
        let at = inner.position(id)?;

        record.id = id;
        record.updated_at = stored_updated_at(&record);

        let reorder = inner.issues[at].created_at != record.created_at;
        inner.issues[at] = record.clone();
        if reorder {
            inner.sort();
        }

        tracing::debug!(issue_id = %id, status = %record.status, "Updated issue");
        Ok(record)
    }

    async fn delete(&mut self, id: IssueId) -> Result<()> {
        let mut inner = self.0.lock().await;
        let at = inner.position(id)?;
        inner.issues.remove(at);

        tracing::info!(issue_id = %id, "Deleted issue");
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
