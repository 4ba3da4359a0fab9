//! CLI argument structs for all commands.

use clap::{Args, Parser};

use super::types::{BackendArg, PriorityArg, StatusArg};
use super::validators::{validate_column, validate_issue_id, validate_title};
use crate::domain::IssueId;
use crate::filter::IssueFilter;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Storage backend to configure
    ///
    /// `remote` writes a placeholder `storage.remote` section to fill in.
    #[arg(short, long, value_enum, default_value_t = BackendArg::Memory)]
    pub backend: BackendArg,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}

/// Filter flags shared by `board` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text matched against title, description and id
    #[arg(short, long)]
    pub search: Option<String>,

    /// Keep issues with any of these priorities (comma-separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub priority: Vec<PriorityArg>,

    /// Keep issues assigned to any of these people (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub assignee: Vec<String>,

    /// Keep issues carrying any of these labels (comma-separated)
    #[arg(short, long = "label", value_delimiter = ',')]
    pub labels: Vec<String>,
}

impl FilterArgs {
    /// Build the domain filter.
    pub fn to_filter(&self) -> IssueFilter {
        IssueFilter {
            search_text: self.search.clone().unwrap_or_default(),
            priority: self.priority.iter().copied().map(Into::into).collect(),
            assignee: self.assignee.clone(),
            labels: self.labels.clone(),
        }
    }
}

/// Arguments for the `board` command
#[derive(Parser, Debug, Clone)]
pub struct BoardArgs {
    /// Filters
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filters
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Only show issues in this column
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Issue ID (`12` or `#12`)
    #[arg(value_parser = validate_issue_id)]
    pub id: IssueId,
}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Issue title (at most 200 characters)
    #[arg(short, long, value_parser = validate_title)]
    pub title: String,

    /// Detailed description
    #[arg(short = 'D', long, default_value = "")]
    pub description: String,

    /// Priority level
    #[arg(short, long, value_enum, default_value_t = PriorityArg::Medium)]
    pub priority: PriorityArg,

    /// Assignee name
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Labels (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub labels: Vec<String>,
}

/// Arguments for the `edit` command
///
/// All flags given are saved together; unchanged values are skipped.
#[derive(Parser, Debug, Clone)]
pub struct EditArgs {
    /// Issue ID (`12` or `#12`)
    #[arg(value_parser = validate_issue_id)]
    pub id: IssueId,

    /// New title
    #[arg(short, long, value_parser = validate_title)]
    pub title: Option<String>,

    /// New description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// New priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// New assignee
    #[arg(short, long, conflicts_with = "unassign")]
    pub assignee: Option<String>,

    /// Clear the assignee
    #[arg(long)]
    pub unassign: bool,

    /// Replace the labels (comma-separated, empty string clears them)
    #[arg(short, long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

/// Arguments for the `move` command
#[derive(Parser, Debug, Clone)]
pub struct MoveArgs {
    /// Issue ID (`12` or `#12`)
    #[arg(value_parser = validate_issue_id)]
    pub id: IssueId,

    /// Target column (`open`, `in-progress`, `review`, `closed`)
    #[arg(value_parser = validate_column)]
    pub column: String,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Issue ID (`12` or `#12`)
    #[arg(value_parser = validate_issue_id)]
    pub id: IssueId,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}
