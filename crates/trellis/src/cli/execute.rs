//! Command execution functions.
//!
//! One `execute_*` function per command. Each takes the loaded [`App`],
//! performs the operation and prints in the requested [`OutputMode`].

use anyhow::Result;
use serde_json::json;

use super::args::{
    BoardArgs, CreateArgs, DeleteArgs, EditArgs, InfoArgs, InitArgs, ListArgs, MoveArgs, ShowArgs,
};
use crate::app::App;
use crate::board::{Board, MoveOutcome};
use crate::domain::{
    Issue, IssueStatus, NewIssue, Priority, ASSIGNEE_SUGGESTIONS, LABEL_SUGGESTIONS,
};
use crate::filter::IssueFilter;
use crate::output::{self, OutputConfig, OutputMode};
use crate::transition::IssueEdit;

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.backend.into()).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&json!({
                "trellis_dir": result.trellis_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "backend": args.backend.to_string(),
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            println!("Initialized trellis in {}", result.trellis_dir.display());
            println!("  Config:  {}", result.config_file.display());
            println!("  Backend: {}", args.backend);
            if result.backend == init::BackendKind::Remote {
                println!(
                    "  Fill in storage.remote in the config, or set {}",
                    init::API_KEY_ENV
                );
            }
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let issues = app.list_issues(&IssueFilter::default()).await?;
    let board = Board::project(&issues);

    match output_mode {
        OutputMode::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = board
                .columns()
                .iter()
                .map(|column| (column.id().to_string(), json!(column.count())))
                .collect();
            output::print_json(&json!({
                "backend": app.describe(),
                "trellis_dir": app.trellis_dir().map(|p| p.display().to_string()),
                "tracked_fields": app.recorder().tracked_fields(),
                "issues": {
                    "total": board.total(),
                    "columns": counts,
                },
                "suggestions": {
                    "assignees": ASSIGNEE_SUGGESTIONS,
                    "labels": LABEL_SUGGESTIONS,
                },
            }))?;
        }
        OutputMode::Text => {
            println!("Trellis Repository Information");
            println!("==============================");
            println!();
            if let Some(dir) = app.trellis_dir() {
                println!("Directory: {}", dir.display());
            }
            println!("Backend:   {}", app.describe());
            println!();
            let parts: Vec<String> = board
                .columns()
                .iter()
                .map(|column| format!("{} {}", column.count(), column.title().to_lowercase()))
                .collect();
            println!("Issues: {} total ({})", board.total(), parts.join(", "));
            println!();
            println!("Assignees: {}", ASSIGNEE_SUGGESTIONS.join(", "));
            println!("Labels:    {}", LABEL_SUGGESTIONS.join(", "));
        }
    }

    Ok(())
}

/// Execute the board command
pub async fn execute_board(app: &App, args: &BoardArgs, output_mode: OutputMode) -> Result<()> {
    let state = app.load_board(&args.filter.to_filter()).await?;
    output::print_board_state(&state, output_mode)?;
    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let mut issues = app.list_issues(&args.filter.to_filter()).await?;
    if let Some(status) = args.status {
        let status = IssueStatus::from(status);
        issues.retain(|issue| issue.status == status);
    }
    output::print_issues(&issues, output_mode)?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let issue = app.get_issue(args.id).await?;
    output::print_issue_details(&issue, output_mode)?;
    Ok(())
}

/// Execute the create command
pub async fn execute_create(
    app: &mut App,
    args: &CreateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let draft = NewIssue {
        title: args.title.clone(),
        description: args.description.clone(),
        priority: Priority::from(args.priority),
        assignee: args.assignee.clone(),
        labels: args.labels.clone(),
        ..NewIssue::default()
    };

    let issue = app.create_issue(draft).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => println!(
            "{}",
            output::success(
                &format!("Created issue #{}: {}", issue.id, issue.title),
                &OutputConfig::from_env()
            )
        ),
    }

    Ok(())
}

/// Edits for the flags that differ from the stored issue.
fn collect_edits(issue: &Issue, args: &EditArgs) -> Vec<IssueEdit> {
    let mut edits = Vec::new();

    if let Some(title) = args.title.as_ref().filter(|t| **t != issue.title) {
        edits.push(IssueEdit::SetTitle(title.clone()));
    }
    if let Some(description) = args
        .description
        .as_ref()
        .filter(|d| **d != issue.description)
    {
        edits.push(IssueEdit::SetDescription(description.clone()));
    }
    if let Some(status) = args.status.map(IssueStatus::from) {
        if status != issue.status {
            edits.push(IssueEdit::SetStatus(status));
        }
    }
    if let Some(priority) = args.priority.map(Priority::from) {
        if priority != issue.priority {
            edits.push(IssueEdit::SetPriority(priority));
        }
    }
    if args.unassign {
        if issue.assignee.is_some() {
            edits.push(IssueEdit::SetAssignee(None));
        }
    } else if let Some(assignee) = &args.assignee {
        if issue.assignee.as_deref() != Some(assignee.trim()) {
            edits.push(IssueEdit::SetAssignee(Some(assignee.clone())));
        }
    }
    if let Some(labels) = &args.labels {
        if crate::domain::normalize_labels(labels) != issue.labels {
            edits.push(IssueEdit::SetLabels(labels.clone()));
        }
    }

    edits
}

/// Execute the edit command
pub async fn execute_edit(app: &mut App, args: &EditArgs, output_mode: OutputMode) -> Result<()> {
    let issue = app.get_issue(args.id).await?;
    let edits = collect_edits(&issue, args);
    let changed = edits.len();

    let saved = app.save_edits(args.id, edits).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&saved)?,
        OutputMode::Text if changed == 0 => println!("No changes to #{}", saved.id),
        OutputMode::Text => println!("Updated issue #{}: {}", saved.id, saved.title),
    }

    Ok(())
}

/// Execute the move command
pub async fn execute_move(app: &mut App, args: &MoveArgs, output_mode: OutputMode) -> Result<()> {
    let outcome = app.move_issue(args.id, &args.column).await?;

    match (output_mode, outcome) {
        (OutputMode::Json, MoveOutcome::Moved(issue)) => {
            output::print_json(&json!({ "moved": true, "issue": issue }))?;
        }
        (OutputMode::Json, MoveOutcome::Unchanged) => {
            output::print_json(&json!({ "moved": false, "id": args.id }))?;
        }
        (OutputMode::Text, MoveOutcome::Moved(issue)) => {
            let message = format!("Moved #{} to {}", issue.id, issue.status);
            println!("{}", output::success(&message, &OutputConfig::from_env()));
        }
        (OutputMode::Text, MoveOutcome::Unchanged) => {
            println!("#{} is already in {}", args.id, args.column);
        }
    }

    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(
    app: &mut App,
    args: &DeleteArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let issue = app.get_issue(args.id).await?;

    if !args.force {
        eprint!("Delete issue #{} ({})? [y/N]: ", issue.id, issue.title);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let response = input.trim().to_lowercase();
        if response != "y" && response != "yes" {
            match output_mode {
                OutputMode::Json => {
                    output::print_json(&json!({ "deleted": null, "status": "cancelled" }))?;
                }
                OutputMode::Text => println!(
                    "{}",
                    output::warning("Deletion cancelled.", &OutputConfig::from_env())
                ),
            }
            return Ok(());
        }
    }

    app.delete_issue(args.id).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&json!({ "deleted": args.id, "status": "success" }))?;
        }
        OutputMode::Text => println!(
            "{}",
            output::success(&format!("Deleted issue #{}", args.id), &OutputConfig::from_env())
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::types::{PriorityArg, StatusArg};
    use crate::domain::IssueId;
    use crate::storage::in_memory::InMemoryStore;
    use crate::transition::TransitionRecorder;
    use chrono::Utc;

    fn stored() -> Issue {
        NewIssue {
            title: "Login bug".to_string(),
            priority: Priority::High,
            assignee: Some("Mike Chen".to_string()),
            labels: vec!["bug".to_string()],
            ..NewIssue::default()
        }
        .into_issue(IssueId::new(1), Utc::now())
    }

    fn edit_args() -> EditArgs {
        EditArgs {
            id: IssueId::new(1),
            title: None,
            description: None,
            status: None,
            priority: None,
            assignee: None,
            unassign: false,
            labels: None,
        }
    }

    #[test]
    fn test_collect_edits_skips_unchanged_values() {
        let args = EditArgs {
            title: Some("Login bug".to_string()),
            priority: Some(PriorityArg::High),
            assignee: Some("Mike Chen".to_string()),
            labels: Some(vec![" bug ".to_string()]),
            ..edit_args()
        };
        assert!(collect_edits(&stored(), &args).is_empty());
    }

    #[test]
    fn test_collect_edits_changes() {
        let args = EditArgs {
            status: Some(StatusArg::Review),
            unassign: true,
            labels: Some(vec!["bug".to_string(), "security".to_string()]),
            ..edit_args()
        };
        let edits = collect_edits(&stored(), &args);

        assert_eq!(
            edits,
            vec![
                IssueEdit::SetStatus(IssueStatus::Review),
                IssueEdit::SetAssignee(None),
                IssueEdit::SetLabels(vec!["bug".to_string(), "security".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_move_and_edit_against_memory_store() {
        let store = InMemoryStore::from_issues(vec![stored()]);
        let mut app = App::new(Box::new(store.clone()), TransitionRecorder::default());

        let move_args = MoveArgs {
            id: IssueId::new(1),
            column: "review".to_string(),
        };
        execute_move(&mut app, &move_args, OutputMode::Json)
            .await
            .unwrap();
        assert_eq!(
            app.get_issue(IssueId::new(1)).await.unwrap().status,
            IssueStatus::Review
        );

        let args = EditArgs {
            title: Some("Login fails on SSO".to_string()),
            ..edit_args()
        };
        execute_edit(&mut app, &args, OutputMode::Json).await.unwrap();
        let saved = app.get_issue(IssueId::new(1)).await.unwrap();
        assert_eq!(saved.title, "Login fails on SSO");
        assert_eq!(saved.history.len(), 2);
    }
}
