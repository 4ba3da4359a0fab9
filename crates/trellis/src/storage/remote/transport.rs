//! Wire types and HTTP transport for the remote records API.
//!
//! Endpoints, all relative to `{base_url}/tables/{table}/records`:
//!
//! | Operation | Request                         | Response          |
//! |-----------|---------------------------------|-------------------|
//! | list      | `GET`                           | [`ListResponse`]  |
//! | get       | `GET /{id}`                     | [`RecordResponse`]|
//! | create    | `POST {"records": [row]}`       | [`BatchResponse`] |
//! | update    | `PUT {"records": [row]}`        | [`BatchResponse`] |
//! | delete    | `DELETE {"recordIds": [id]}`    | [`BatchResponse`] |

use super::codec::value_as_id;
use crate::domain::IssueId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// A record as the remote table sees it: column name to value.
pub type Row = serde_json::Map<String, Value>;

/// Response of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Whether the request succeeded
    pub success: bool,

    /// All rows of the table
    #[serde(default)]
    pub data: Vec<Row>,

    /// Failure detail
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the single-record endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    /// Whether the request succeeded
    pub success: bool,

    /// The row, if it exists
    #[serde(default)]
    pub data: Option<Row>,

    /// Failure detail
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the create, update and delete endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Whether the request as a whole was accepted
    pub success: bool,

    /// One outcome per submitted record, in submission order
    #[serde(default)]
    pub results: Vec<RecordOutcome>,

    /// Failure detail for the whole request
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome for one record of a batch request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Whether this record was written
    pub success: bool,

    /// The stored row, when the server echoes it
    #[serde(default)]
    pub data: Option<Row>,

    /// Failure detail
    #[serde(default)]
    pub message: Option<String>,

    /// Per-field validation failures
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl RecordOutcome {
    /// Human-readable failure detail combining the message and field errors.
    pub fn detail(&self) -> String {
        let mut parts: Vec<String> = self.message.iter().cloned().collect();
        parts.extend(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message)),
        );
        if parts.is_empty() {
            "record rejected".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// Whether the server rejected the record because it does not exist.
    pub fn is_not_found(&self) -> bool {
        mentions_not_found(self.message.as_deref())
    }
}

impl BatchResponse {
    /// Whether the whole request was rejected because its record does not
    /// exist.
    pub fn is_not_found(&self) -> bool {
        !self.success && self.results.is_empty() && mentions_not_found(self.message.as_deref())
    }
}

fn mentions_not_found(message: Option<&str>) -> bool {
    message.is_some_and(|m| m.to_lowercase().contains("not found"))
}

/// A validation failure for one column of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Column name
    #[serde(default)]
    pub field: String,

    /// What was wrong
    #[serde(default)]
    pub message: String,
}

/// Raw access to the remote records API.
///
/// [`HttpTransport`] is the production implementation; tests plug in an
/// in-process fake.
#[async_trait]
pub trait RecordTransport: Send + Sync {
    /// Fetch every row of the table.
    async fn fetch_all(&self) -> Result<ListResponse>;

    /// Fetch one row by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the server answers 404.
    async fn fetch_one(&self, id: IssueId) -> Result<RecordResponse>;

    /// Insert rows. The server assigns ids.
    async fn create_records(&self, rows: Vec<Row>) -> Result<BatchResponse>;

    /// Replace rows, matched by their id column.
    async fn update_records(&self, rows: Vec<Row>) -> Result<BatchResponse>;

    /// Delete rows by id.
    async fn delete_records(&self, ids: Vec<IssueId>) -> Result<BatchResponse>;
}

/// [`RecordTransport`] over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    table: String,
    id_column: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport with its own client.
    ///
    /// `id_column` names the column that identifies a row in update
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        table: &str,
        id_column: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::StoreUnavailable(format!("Failed to create client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            id_column: id_column.to_string(),
            api_key,
        })
    }

    fn records_url(&self, id: Option<IssueId>) -> String {
        let url = format!("{}/tables/{}/records", self.base_url, self.table);
        match id {
            Some(id) => format!("{url}/{id}"),
            None => url,
        }
    }

    /// Id of the only row in an update request.
    fn single_target(&self, rows: &[Row]) -> Option<IssueId> {
        match rows {
            [row] => row.get(&self.id_column).and_then(value_as_id),
            _ => None,
        }
    }

    /// Send one request and decode the JSON body.
    ///
    /// `id` selects the single-record URL. `target` is the one record the
    /// request is about, if any: a 404 becomes `NotFound` for it. That covers
    /// a single fetch and single-record updates and deletes. A 404 on a
    /// multi-record request, and every other failure, becomes
    /// `StoreUnavailable`.
    async fn request<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        id: Option<IssueId>,
        target: Option<IssueId>,
        body: Option<Value>,
    ) -> Result<T> {
        let url = self.records_url(id);
        tracing::debug!(method = method.as_str(), url = url.as_str(), "Remote request");

        let mut req = self.client.request(method, &url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(target) = target {
                return Err(Error::NotFound(target));
            }
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::StoreUnavailable(format!(
                "Request failed with status {status}: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl RecordTransport for HttpTransport {
    async fn fetch_all(&self) -> Result<ListResponse> {
        self.request(reqwest::Method::GET, None, None, None).await
    }

    async fn fetch_one(&self, id: IssueId) -> Result<RecordResponse> {
        self.request(reqwest::Method::GET, Some(id), Some(id), None)
            .await
    }

    async fn create_records(&self, rows: Vec<Row>) -> Result<BatchResponse> {
        self.request(
            reqwest::Method::POST,
            None,
            None,
            Some(json!({ "records": rows })),
        )
        .await
    }

    async fn update_records(&self, rows: Vec<Row>) -> Result<BatchResponse> {
        let target = self.single_target(&rows);
        self.request(
            reqwest::Method::PUT,
            None,
            target,
            Some(json!({ "records": rows })),
        )
        .await
    }

    async fn delete_records(&self, ids: Vec<IssueId>) -> Result<BatchResponse> {
        let target = match ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        };
        self.request(
            reqwest::Method::DELETE,
            None,
            target,
            Some(json!({ "recordIds": ids })),
        )
        .await
    }
}
