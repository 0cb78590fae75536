use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::recurring::Frequency;
use crate::model::state::Theme;
use crate::model::task::{Category, Priority};
use crate::ops::view::{SortKey, StatusFilter};

#[derive(Parser)]
#[command(name = "tick", about = concat!("[x] ticklist v", env!("CARGO_PKG_VERSION"), " - a task list with undo"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep data in a different directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks through the view filters
    List(ListArgs),
    /// Show task counts
    Stats,
    /// Flip a task between done and not done
    Toggle(IdArg),
    /// Delete a task
    Rm(IdArg),
    /// Replace a task's text
    Edit(EditArgs),
    /// Set or clear a task's due date
    Due(DueArgs),
    /// Delete all completed tasks
    ClearDone,
    /// Apply one change to many tasks
    Batch(BatchCmd),
    /// Undo the last task change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Show the undo history position
    History,
    /// Show overdue tasks and tasks due soon
    Agenda,
    /// Manage a task's subtasks
    Sub(SubCmd),
    /// Manage tags
    Tag(TagCmd),
    /// Export all tasks
    Export(ExportArgs),
    /// Replace all tasks with an exported JSON file
    Import(ImportArgs),
    /// Show or change the theme
    Theme(ThemeArgs),
    /// Manage recurring task templates
    Recur(RecurCmd),
    /// Wait, then show a reminder notification
    Remind(RemindArgs),
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task ID (or a unique prefix of at least 4 characters)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// Category (personal, work, shopping, health, or any other name)
    #[arg(short, long)]
    pub category: Option<Category>,
    /// Priority (high, medium, low)
    #[arg(short, long)]
    pub priority: Option<Priority>,
    /// Due date (YYYY-MM-DD, today, tomorrow, or +N days)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Completion filter (all, active, done)
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,
    /// Only show this category
    #[arg(long)]
    pub category: Option<Category>,
    /// Case-insensitive text search
    #[arg(long, short)]
    pub search: Option<String>,
    /// Sort order (date, priority, name); defaults to the configured order
    #[arg(long)]
    pub sort: Option<SortKey>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct DueArgs {
    /// Task ID
    pub id: String,
    /// Due date (YYYY-MM-DD, today, tomorrow, or +N days)
    #[arg(required_unless_present = "clear")]
    pub date: Option<String>,
    /// Remove the due date
    #[arg(long, conflicts_with = "date")]
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BatchCmd {
    #[command(subcommand)]
    pub action: BatchAction,
}

#[derive(Subcommand)]
pub enum BatchAction {
    /// Mark tasks done
    Done(BatchTarget),
    /// Mark tasks not done
    Undone(BatchTarget),
    /// Delete tasks
    Delete(BatchTarget),
    /// Move tasks to a category
    Move(BatchMoveArgs),
    /// Set the priority of tasks
    Priority(BatchPriorityArgs),
}

/// Which tasks a batch command applies to: explicit ids, or every task
/// matching the selection filters
#[derive(Args)]
pub struct BatchTarget {
    /// Task IDs
    pub ids: Vec<String>,
    /// Select tasks by completion (all, active, done)
    #[arg(long, conflicts_with = "ids")]
    pub status: Option<StatusFilter>,
    /// Select tasks in this category
    #[arg(long = "in", value_name = "CATEGORY", conflicts_with = "ids")]
    pub in_category: Option<Category>,
}

#[derive(Args)]
pub struct BatchMoveArgs {
    #[command(flatten)]
    pub target: BatchTarget,
    /// Destination category
    #[arg(long)]
    pub to: Category,
}

#[derive(Args)]
pub struct BatchPriorityArgs {
    #[command(flatten)]
    pub target: BatchTarget,
    /// New priority
    #[arg(long)]
    pub to: Priority,
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a subtask
    Add(SubAddArgs),
    /// Flip a subtask between done and not done
    Toggle(SubRefArgs),
    /// Delete a subtask
    Rm(SubRefArgs),
    /// List a task's subtasks with progress
    List(IdArg),
    /// Delete all of a task's subtasks
    Clear(IdArg),
    /// Delete subtasks whose task no longer exists
    Prune,
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Parent task ID
    pub task: String,
    /// Subtask text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct SubRefArgs {
    /// Parent task ID
    pub task: String,
    /// Subtask number (1-based) or ID prefix
    pub subtask: String,
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TagCmd {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add(TagAddArgs),
    /// Delete a tag
    Rm(TagRefArg),
    /// Rename or recolor a tag
    Edit(TagEditArgs),
    /// List tags
    List,
}

#[derive(Args)]
pub struct TagAddArgs {
    /// Tag name
    pub name: String,
}

#[derive(Args)]
pub struct TagRefArg {
    /// Tag ID or name
    pub tag: String,
}

#[derive(Args)]
pub struct TagEditArgs {
    /// Tag ID or name
    pub tag: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New color (#rrggbb)
    #[arg(long)]
    pub color: Option<String>,
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(value_enum)]
    pub format: ExportFormat,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file produced by `tick export json`
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeChoice {
    Dark,
    Light,
    Toggle,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// New theme; omit to show the current one
    #[arg(value_enum)]
    pub theme: Option<ThemeChoice>,
}

impl ThemeChoice {
    /// The theme to switch to, given the current one
    pub fn resolve(self, current: Theme) -> Theme {
        match self {
            ThemeChoice::Dark => Theme::Dark,
            ThemeChoice::Light => Theme::Light,
            ThemeChoice::Toggle => current.toggled(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recurring
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecurCmd {
    #[command(subcommand)]
    pub action: RecurAction,
}

#[derive(Subcommand)]
pub enum RecurAction {
    /// Register a recurring task template
    Add(RecurAddArgs),
    /// List templates
    List,
    /// Delete a template
    Rm(RecurRmArgs),
    /// Create tasks for every template whose interval has elapsed
    Run,
}

#[derive(Args)]
pub struct RecurAddArgs {
    /// Task text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// How often (daily, weekly, monthly)
    #[arg(long)]
    pub every: Frequency,
    #[arg(short, long)]
    pub category: Option<Category>,
    #[arg(short, long)]
    pub priority: Option<Priority>,
}

#[derive(Args)]
pub struct RecurRmArgs {
    /// Template number as shown by `recur list` (1-based)
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Reminder
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RemindArgs {
    /// Reminder text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// Delay before the reminder fires (e.g. 90, 30s, 5m, 1h)
    #[arg(long = "in", value_name = "DELAY")]
    pub delay: String,
}
