use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tada", about = "A small to-do list with reminders", version)]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.tada/tada.db]
    #[arg(long, env = "TADA_DB", global = true)]
    pub db: Option<String>,

    /// Path to the config file [default: ~/.tada/config.toml]
    #[arg(long, env = "TADA_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Task text
        text: String,
        /// Reminder time (YYYY-MM-DD HH:MM local, or RFC 3339)
        #[arg(short, long)]
        remind: Option<String>,
    },

    /// Mark a task as completed
    Done {
        /// Position as shown by `list`
        position: usize,
    },

    /// Move a task to the deleted list
    Rm {
        /// Position as shown by `list`
        position: usize,
    },

    /// Restore a deleted task
    Undo {
        /// Position in the deleted list [default: most recently deleted]
        position: Option<usize>,
    },

    /// List tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the reminder and retention sweeps once
    Sweep,

    /// Run the timers in the foreground, printing reminders as they fire
    Run,

    /// Launch interactive TUI
    Ui {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "250", value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: u64,
    },
}
