//! Remote storage backend over a tabular records API.
//!
//! Issues are mapped to rows through a [`ColumnMap`] and sent through a
//! [`RecordTransport`]. The server assigns ids on create. Rows that cannot
//! be decoded (no id, unknown status) are skipped on `list` with a warning.

mod codec;
mod transport;

pub use codec::{decode_history, encode_history, ColumnMap, DecodeError};
pub use transport::{
    BatchResponse, FieldError, HttpTransport, ListResponse, RecordOutcome, RecordResponse,
    RecordTransport, Row,
};

use crate::domain::{normalize_labels, Issue, IssueId, NewIssue};
use crate::error::{Error, Result};
use crate::storage::{stored_updated_at, BatchError, BatchResult, IssueStore};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::time::Duration;

/// Default HTTP timeout for the remote backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the remote backend.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// API root, e.g. `https://records.example.com/api`
    pub base_url: String,

    /// Table holding the issues
    pub table: String,

    /// Bearer token, if the API needs one
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Column names for each issue field
    pub columns: ColumnMap,
}

impl RemoteConfig {
    /// Settings for `table` at `base_url` with default timeout and columns.
    pub fn new(base_url: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            table: table.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            columns: ColumnMap::default(),
        }
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("columns", &self.columns)
            .finish()
    }
}

/// Store backed by a remote records API.
pub struct RemoteStore<T: RecordTransport = HttpTransport> {
    transport: T,
    columns: ColumnMap,
    label: String,
}

impl RemoteStore<HttpTransport> {
    /// Build a store talking HTTP to the configured API.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable` if the HTTP client cannot be built.
    pub fn connect(config: RemoteConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.base_url,
            &config.table,
            &config.columns.id,
            config.api_key,
            config.timeout,
        )?;
        let label = format!("remote ({}, table {})", config.base_url, config.table);
        Ok(Self::with_transport(transport, config.columns, label))
    }
}

impl<T: RecordTransport> RemoteStore<T> {
    /// Build a store over any transport.
    pub fn with_transport(transport: T, columns: ColumnMap, label: impl Into<String>) -> Self {
        Self {
            transport,
            columns,
            label: label.into(),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn decode_outcome(&self, outcome: RecordOutcome, fallback: Option<Issue>) -> Result<Issue> {
        if !outcome.success {
            return Err(Error::StoreUnavailable(outcome.detail()));
        }
        match (outcome.data, fallback) {
            (Some(row), _) => self
                .columns
                .decode(&row)
                .map_err(|e| Error::StoreUnavailable(e.to_string())),
            (None, Some(issue)) => Ok(issue),
            (None, None) => Err(Error::StoreUnavailable(
                "server did not return the stored record".to_string(),
            )),
        }
    }
}

/// Outcome of a single-record update or delete of `id`.
///
/// A not-found answer, whether for the request as a whole or for the one
/// record, becomes `NotFound`.
fn write_outcome(response: BatchResponse, id: IssueId) -> Result<RecordOutcome> {
    if response.is_not_found() {
        return Err(Error::NotFound(id));
    }
    let outcome = single_outcome(response)?;
    if !outcome.success && outcome.is_not_found() {
        return Err(Error::NotFound(id));
    }
    Ok(outcome)
}

/// First outcome of a single-record batch call.
fn single_outcome(response: BatchResponse) -> Result<RecordOutcome> {
    let BatchResponse {
        success,
        results,
        message,
    } = response;
    match results.into_iter().next() {
        Some(outcome) => Ok(outcome),
        None if success => Ok(RecordOutcome {
            success: true,
            ..RecordOutcome::default()
        }),
        None => Err(Error::StoreUnavailable(
            message.unwrap_or_else(|| "request rejected".to_string()),
        )),
    }
}

#[async_trait]
impl<T: RecordTransport> IssueStore for RemoteStore<T> {
    async fn list(&self) -> Result<Vec<Issue>> {
        let response = self.transport.fetch_all().await?;
        if !response.success {
            return Err(Error::StoreUnavailable(
                response
                    .message
                    .unwrap_or_else(|| "list request failed".to_string()),
            ));
        }

        let mut issues: Vec<Issue> = response
            .data
            .iter()
            .filter_map(|row| match self.columns.decode(row) {
                Ok(issue) => Some(issue),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping remote record");
                    None
                }
            })
            .collect();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        tracing::debug!(count = issues.len(), "Listed remote issues");
        Ok(issues)
    }

    async fn get(&self, id: IssueId) -> Result<Issue> {
        let response = self.transport.fetch_one(id).await?;
        let Some(row) = response.data else {
            return Err(Error::NotFound(id));
        };
        self.columns
            .decode(&row)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }

    async fn create(&mut self, draft: NewIssue) -> Result<Issue> {
        draft.validate()?;
        let pending = draft.into_issue(IssueId::new(0), Utc::now());
        let row = self.columns.encode(&pending, false);

        let outcome = single_outcome(self.transport.create_records(vec![row]).await?)?;
        let issue = self.decode_outcome(outcome, None)?;

        tracing::info!(issue_id = %issue.id, "Created remote issue");
        Ok(issue)
    }

    async fn create_many(&mut self, drafts: Vec<NewIssue>) -> Result<BatchResult> {
        let mut result = BatchResult::default();
        let mut submitted = Vec::new();
        let mut rows = Vec::new();
        let now = Utc::now();

        for (index, draft) in drafts.into_iter().enumerate() {
            match draft.validate() {
                Ok(()) => {
                    let pending = draft.into_issue(IssueId::new(0), now);
                    rows.push(self.columns.encode(&pending, false));
                    submitted.push(index);
                }
                Err(error) => result.failed.push(BatchError { index, error }),
            }
        }

        if !rows.is_empty() {
            let response = self.transport.create_records(rows).await?;
            let fallback = response
                .message
                .clone()
                .unwrap_or_else(|| "no result returned".to_string());
            let mut outcomes = response.results.into_iter();

            for index in submitted {
                let outcome = outcomes.next().ok_or_else(|| {
                    Error::StoreUnavailable(format!("record {index}: {fallback}"))
                });
                match outcome.and_then(|o| self.decode_outcome(o, None)) {
                    Ok(issue) => result.created.push(issue),
                    Err(error) => {
                        tracing::warn!(index, error = %error, "Batch record failed");
                        result.failed.push(BatchError { index, error });
                    }
                }
            }
        }

        tracing::info!(
            created = result.created.len(),
            failed = result.failed.len(),
            "Created remote issues"
        );
        result.into_result()
    }

    async fn update(&mut self, id: IssueId, mut record: Issue) -> Result<Issue> {
        record.id = id;
        record.labels = normalize_labels(std::mem::take(&mut record.labels));
        record.updated_at = stored_updated_at(&record);
        let row = self.columns.encode(&record, true);

        let outcome = write_outcome(self.transport.update_records(vec![row]).await?, id)?;
        let issue = self.decode_outcome(outcome, Some(record))?;

        tracing::debug!(issue_id = %id, status = %issue.status, "Updated remote issue");
        Ok(issue)
    }

    async fn delete(&mut self, id: IssueId) -> Result<()> {
        let outcome = write_outcome(self.transport.delete_records(vec![id]).await?, id)?;
        if !outcome.success {
            return Err(Error::StoreUnavailable(outcome.detail()));
        }

        tracing::info!(issue_id = %id, "Deleted remote issue");
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_hides_api_key() {
        let config = RemoteConfig::new("https://records.example.com/api", "issues")
            .with_api_key("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_single_outcome() {
        let accepted = single_outcome(BatchResponse {
            success: true,
            ..BatchResponse::default()
        })
        .unwrap();
        assert!(accepted.success);

        let rejected = single_outcome(BatchResponse {
            success: false,
            message: Some("table locked".to_string()),
            ..BatchResponse::default()
        })
        .unwrap_err();
        assert!(rejected.is_unavailable());
        assert!(rejected.to_string().contains("table locked"));
    }

    #[test]
    fn test_write_outcome_maps_not_found() {
        let id = IssueId::new(9);
        let batch_level = write_outcome(
            BatchResponse {
                success: false,
                message: Some("Record not found".to_string()),
                ..BatchResponse::default()
            },
            id,
        )
        .unwrap_err();
        assert!(matches!(batch_level, Error::NotFound(missing) if missing == id));

        let per_record = write_outcome(
            BatchResponse {
                success: false,
                results: vec![RecordOutcome {
                    message: Some("Record not found".to_string()),
                    ..RecordOutcome::default()
                }],
                message: None,
            },
            id,
        )
        .unwrap_err();
        assert!(per_record.is_not_found());

        let locked = write_outcome(
            BatchResponse {
                success: false,
                message: Some("table locked".to_string()),
                ..BatchResponse::default()
            },
            id,
        )
        .unwrap_err();
        assert!(locked.is_unavailable());
    }

    #[test]
    fn test_connect_describes_backend() {
        let store = RemoteStore::connect(RemoteConfig::new("http://localhost:9", "issues")).unwrap();
        assert_eq!(store.describe(), "remote (http://localhost:9, table issues)");
    }
}
