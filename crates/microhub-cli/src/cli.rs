use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use microhub_core::models::{Priority, TaskStatus};

#[derive(Parser)]
#[command(name = "microhub")]
#[command(about = "Tasks, journal, movies and timers with optional remote sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the local database
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Skip the remote: no startup pull, no pushes
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show greeting, counts and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect to a remote store
    Connect(ConnectArgs),
    /// Forget the remote connection and username
    Disconnect,
    /// Pull the remote snapshot now
    Pull,
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),
    /// Manage journal entries
    #[command(subcommand)]
    Journal(JournalCommands),
    /// Manage the movie watchlist
    #[command(subcommand)]
    Movie(MovieCommands),
    /// Manage the profile
    #[command(subcommand)]
    User(UserCommands),
    /// Set the accent colours
    Theme {
        /// Primary colour (#rgb or #rrggbb)
        #[arg(long, value_name = "HEX")]
        primary: String,
        /// Secondary colour (#rgb or #rrggbb)
        #[arg(long, value_name = "HEX")]
        secondary: String,
    },
    /// Remember the screen to open next time
    Route {
        /// Screen name, e.g. TASKS or JOURNAL
        route: String,
    },
    /// Ask the AI assistant
    Ask {
        /// Prompt text
        prompt: Vec<String>,
    },
    /// Generate an image URL for a prompt
    Image {
        /// Prompt text
        prompt: Vec<String>,
    },
    /// Run a countdown timer
    Timer {
        /// Duration in minutes
        #[arg(short, long, default_value = "25")]
        minutes: u64,
    },
    /// Run a stopwatch; Enter records a lap, q stops
    Stopwatch,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Remote endpoint URL
    #[arg(long, value_name = "URL")]
    pub url: String,
    /// Remote store id
    #[arg(long, value_name = "ID")]
    pub store: String,
    /// Display name for a new or wiped store
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
    /// Access key for a returning store
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,
    /// Lost key: erase the remote store and issue a new key
    #[arg(long)]
    pub wipe: bool,
    /// Confirm --wipe
    #[arg(long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a backlog task
    Add {
        /// Task title
        title: Vec<String>,
        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
    },
    /// List tasks
    List {
        /// Only tasks in this column
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a task to another column
    Move {
        /// Task ID or unique ID prefix
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum JournalCommands {
    /// Write a new entry; #hashtags in the content become tags
    Add {
        #[arg(short, long, default_value = "")]
        title: String,
        /// Entry content
        content: Vec<String>,
    },
    /// List entries
    List {
        /// Only entries with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace an entry's title and content
    Edit {
        /// Entry ID or unique ID prefix
        id: String,
        #[arg(short, long, default_value = "")]
        title: String,
        /// New content
        content: Vec<String>,
    },
    /// Delete an entry
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum MovieCommands {
    /// Search the movie catalogue
    Search {
        query: Vec<String>,
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Add a movie to the watchlist
    Add {
        /// Movie title
        title: Vec<String>,
        /// Skip the catalogue lookup and store the title as given
        #[arg(long)]
        manual: bool,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        director: Option<String>,
    },
    /// List the watchlist
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a movie as watched
    Watched {
        /// Movie ID or unique ID prefix
        id: String,
    },
    /// Move a movie back to the watchlist
    Unwatch {
        /// Movie ID or unique ID prefix
        id: String,
    },
    /// Delete a movie
    Delete {
        /// Movie ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Change the display name
    SetName { name: Vec<String> },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Backlog,
    Active,
    #[value(alias = "done")]
    Archive,
}

impl From<StatusArg> for TaskStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Backlog => Self::Backlog,
            StatusArg::Active => Self::Active,
            StatusArg::Archive => Self::Archive,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
