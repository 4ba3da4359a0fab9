//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new trellis repository
//! - `info`: Show the backend and per-column counts
//! - `board`: Show the Kanban board
//! - `list`: List issues with optional filters
//! - `show`: Show issue details and activity
//! - `create`: Create a new issue
//! - `edit`: Edit and save an issue
//! - `move`: Move an issue to another column
//! - `delete`: Delete an issue
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! trellis create --title "Login bug" --priority high --labels bug,security
//! trellis board --priority high,critical
//! trellis move 12 in-progress
//! trellis edit 12 --assignee "Sarah Johnson"
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BoardArgs, CreateArgs, DeleteArgs, EditArgs, FilterArgs, InfoArgs, InitArgs, ListArgs,
    MoveArgs, ShowArgs,
};
pub use types::{BackendArg, PriorityArg, StatusArg};
pub use validators::{validate_column, validate_issue_id, validate_title};

/// Trellis - a Kanban-style issue tracker
///
/// Issues live in one of four columns: Open, In Progress, Review and
/// Closed. Storage is configured in `.trellis/config.yaml`.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new trellis repository
    ///
    /// Creates `.trellis/config.yaml`. Run this once in your project root.
    Init(InitArgs),

    /// Show repository information
    ///
    /// Displays the storage backend and how many issues sit in each column.
    Info(InfoArgs),

    /// Show the board
    ///
    /// Groups the filtered issues into the Open, In Progress, Review and
    /// Closed columns.
    Board(BoardArgs),

    /// List issues with optional filters, newest first
    List(ListArgs),

    /// Show an issue with its activity history
    Show(ShowArgs),

    /// Create a new issue
    Create(CreateArgs),

    /// Edit an issue
    ///
    /// All given flags are saved at once. Status changes are recorded in
    /// the activity history.
    Edit(EditArgs),

    /// Move an issue to another column
    ///
    /// Moving an issue onto the column it is already in does nothing.
    Move(MoveArgs),

    /// Delete an issue permanently
    ///
    /// This cannot be undone. Use `--force` to skip confirmation.
    Delete(DeleteArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from loading the repository or running the command.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::Board(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_board(&app, args, output_mode).await
            }
            Some(Commands::List(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_list(&app, args, output_mode).await
            }
            Some(Commands::Show(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_show(&app, args, output_mode).await
            }
            Some(Commands::Create(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_create(&mut app, args, output_mode).await
            }
            Some(Commands::Edit(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_edit(&mut app, args, output_mode).await
            }
            Some(Commands::Move(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_move(&mut app, args, output_mode).await
            }
            Some(Commands::Delete(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_delete(&mut app, args, output_mode).await
            }
            None => {
                println!("Trellis issue board");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
