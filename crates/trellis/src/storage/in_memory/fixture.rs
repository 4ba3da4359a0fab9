//! Built-in demo issues used to seed the in-memory store.

use crate::domain::Issue;
use crate::error::Result;

const FIXTURE: &str = include_str!("../../../fixtures/issues.json");

/// Decode the embedded fixture issues.
///
/// # Errors
///
/// Returns `Error::Json` if the fixture is malformed.
pub fn fixture_issues() -> Result<Vec<Issue>> {
    Ok(serde_json::from_str(FIXTURE)?)
}
