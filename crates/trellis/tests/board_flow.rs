//! End-to-end board flows through [`App`]: load, filter, drag and edit.

use trellis::app::App;
use trellis::board::{BoardState, MoveOutcome};
use trellis::domain::{IssueId, IssueStatus, NewIssue, Priority};
use trellis::error::Error;
use trellis::filter::IssueFilter;
use trellis::storage::in_memory::InMemoryStore;
use trellis::storage::IssueStore;
use trellis::transition::{Field, IssueEdit, TransitionRecorder};

fn seeded_app() -> (App, InMemoryStore) {
    let store = InMemoryStore::seeded().expect("fixture should load");
    let app = App::new(Box::new(store.clone()), TransitionRecorder::default());
    (app, store)
}

#[tokio::test]
async fn test_empty_store_and_no_matches_are_distinct() {
    let app = App::new(
        Box::new(InMemoryStore::new()),
        TransitionRecorder::default(),
    );
    assert_eq!(
        app.load_board(&IssueFilter::default()).await.unwrap(),
        BoardState::NoIssues
    );

    let (app, _) = seeded_app();
    assert_eq!(
        app.load_board(&IssueFilter::search("zzz")).await.unwrap(),
        BoardState::NoMatches { total: 8 }
    );
}

#[tokio::test]
async fn test_filtered_board_counts() {
    let (app, _) = seeded_app();
    let filter = IssueFilter {
        labels: vec!["bug".to_string()],
        ..IssueFilter::default()
    };

    let state = app.load_board(&filter).await.unwrap();
    let board = state.board().expect("board should be ready");

    assert_eq!(board.total(), 2);
    assert_eq!(board.column(IssueStatus::Open).unwrap().count(), 1);
    assert_eq!(board.column(IssueStatus::InProgress).unwrap().count(), 1);
    assert!(board.column(IssueStatus::Closed).unwrap().is_empty());
}

#[tokio::test]
async fn test_drag_to_new_column_then_back() {
    let (mut app, store) = seeded_app();
    let id = IssueId::new(3);
    let before = app.get_issue(id).await.unwrap();

    let MoveOutcome::Moved(moved) = app.move_issue(id, "in-progress").await.unwrap() else {
        panic!("expected a move");
    };
    assert_eq!(moved.status, IssueStatus::InProgress);
    assert!(moved.updated_at > before.updated_at);
    assert_eq!(moved.history[..before.history.len()], before.history[..]);

    let last = moved.history.last().unwrap();
    assert_eq!(last.field.as_deref(), Some("status"));
    assert_eq!(last.old_value.as_deref(), Some("Open"));
    assert_eq!(last.new_value.as_deref(), Some("In Progress"));

    let again = app.move_issue(id, "In Progress").await.unwrap();
    assert_eq!(again, MoveOutcome::Unchanged);
    assert_eq!(store.get(id).await.unwrap(), moved);
}

#[tokio::test]
async fn test_move_unknown_issue_or_column() {
    let (mut app, _) = seeded_app();

    let err = app.move_issue(IssueId::new(99), "review").await.unwrap_err();
    assert!(err.is_not_found());

    let err = app.move_issue(IssueId::new(3), "blocked").await.unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn test_tracked_fields_extend_history() {
    let store = InMemoryStore::new();
    let recorder = TransitionRecorder::new([Field::Priority, Field::Assignee]);
    let mut app = App::new(Box::new(store), recorder);

    let issue = app.create_issue(NewIssue::new("Dark mode")).await.unwrap();
    let saved = app
        .save_edits(
            issue.id,
            vec![
                IssueEdit::SetPriority(Priority::Critical),
                IssueEdit::SetAssignee(Some("Emily Davis".to_string())),
                IssueEdit::SetDescription("Follow the OS theme".to_string()),
            ],
        )
        .await
        .unwrap();

    let fields: Vec<_> = saved
        .history
        .iter()
        .filter_map(|entry| entry.field.as_deref())
        .collect();
    assert_eq!(fields, vec!["priority", "assignee"]);
    assert_eq!(saved.history[1].timestamp, saved.history[2].timestamp);
    assert!(saved.updated_at >= saved.history[2].timestamp);
}
