//! Command-line interface for offline administration.
//!
//! Works directly on the data files the servers use, so it can be run while
//! they are up. Text output goes through the same messages the MCP tools
//! return; `--json` prints raw records instead.

mod connections;
mod note;
mod run;
mod task;

#[cfg(test)]
mod tests;

pub use connections::ConnectionsCommand;
pub use note::NoteCommand;
pub use run::{execute, run, CliOutput};
pub use task::TaskCommand;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personal assistant CLI: tasks, notes and MCP connections.
///
/// Settings are read from `$PERSONAL_MCP_CONFIG`,
/// `./config/personal-mcp.yaml` or the per-user config directory, in that
/// order, unless `--config` is given.
#[derive(Parser, Debug)]
#[command(name = "personal-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Read settings from this YAML file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print raw JSON records instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Task management - add, list, complete, delete and search tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Note management - add and list notes.
    #[command(subcommand)]
    Note(NoteCommand),

    /// Inspect the MCP clients that have used the server.
    #[command(subcommand)]
    Connections(ConnectionsCommand),

    /// Show the effective settings as YAML.
    Config {
        /// Also write them to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}
