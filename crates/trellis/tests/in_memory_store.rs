//! Integration tests for the in-memory store through the public API.

use rstest::rstest;
use trellis::domain::{IssueId, IssueStatus, NewIssue, Priority, CREATED_ACTION};
use trellis::error::Error;
use trellis::filter::{apply_filters, IssueFilter};
use trellis::storage::in_memory::{fixture_issues, new_in_memory_store};
use trellis::storage::{create_store, IssueStore, StoreBackend};

async fn empty_store() -> Box<dyn IssueStore> {
    create_store(StoreBackend::InMemory { seed: false })
        .await
        .expect("in-memory store")
}

#[tokio::test]
async fn test_created_ids_increase_and_history_is_seeded() {
    let mut store = empty_store().await;

    let mut last = 0;
    for title in ["Login bug", "Dark mode", "Export board"] {
        let issue = store.create(NewIssue::new(title)).await.unwrap();
        assert!(issue.id.get() > last);
        last = issue.id.get();

        assert_eq!(issue.history.len(), 1);
        assert_eq!(issue.history[0].action, CREATED_ACTION);
        assert_eq!(issue.created_at, issue.updated_at);
    }
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn test_blank_title_is_rejected(#[case] title: &str) {
    let mut store = empty_store().await;
    let err = store.create(NewIssue::new(title)).await.unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let mut store = empty_store().await;
    let issue = store.create(NewIssue::new("Short-lived")).await.unwrap();

    store.delete(issue.id).await.unwrap();

    assert!(store.get(issue.id).await.unwrap_err().is_not_found());
    assert!(store.delete(issue.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_missing_id_leaves_collection_unchanged() {
    let mut store = empty_store().await;
    let issue = store.create(NewIssue::new("Keep me")).await.unwrap();
    let before = store.list().await.unwrap();

    let err = store.update(IssueId::new(42), issue).await.unwrap_err();

    assert!(matches!(err, Error::NotFound(id) if id == IssueId::new(42)));
    assert_eq!(store.list().await.unwrap(), before);
}

#[tokio::test]
async fn test_create_many_reports_each_draft() {
    let mut store = empty_store().await;

    let result = store
        .create_many(vec![
            NewIssue::new("First"),
            NewIssue::new(""),
            NewIssue::new("Third"),
        ])
        .await
        .unwrap();

    assert_eq!(result.created.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].index, 1);
    assert!(!result.is_complete());
}

#[tokio::test]
async fn test_create_many_with_no_success_is_an_error() {
    let mut store = empty_store().await;
    let err = store
        .create_many(vec![NewIssue::new(""), NewIssue::new(" ")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn test_seeded_store_matches_fixture() {
    let store = create_store(StoreBackend::InMemory { seed: true })
        .await
        .unwrap();
    let listed = store.list().await.unwrap();
    let fixture = fixture_issues().unwrap();

    assert_eq!(listed.len(), fixture.len());
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
async fn test_default_filter_returns_list_unchanged() {
    let mut store = new_in_memory_store();
    store
        .create(NewIssue {
            title: "Login bug".to_string(),
            priority: Priority::High,
            labels: vec!["bug".to_string()],
            ..NewIssue::default()
        })
        .await
        .unwrap();
    store
        .create(NewIssue {
            title: "Dark mode".to_string(),
            status: IssueStatus::Closed,
            priority: Priority::Low,
            labels: vec!["feature".to_string()],
            ..NewIssue::default()
        })
        .await
        .unwrap();

    let issues = store.list().await.unwrap();
    assert_eq!(apply_filters(&issues, &IssueFilter::default()), issues);

    let high = IssueFilter {
        priority: vec![Priority::High],
        ..IssueFilter::default()
    };
    let titles: Vec<_> = apply_filters(&issues, &high)
        .into_iter()
        .map(|issue| issue.title)
        .collect();
    assert_eq!(titles, vec!["Login bug"]);
}
