//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::{Cli, Command, ConnectionsCommand, NoteCommand, TaskCommand};
use crate::config::Settings;
use crate::connections::{ClientStatus, ConnectionMonitor};
use crate::error::{Error, Result};
use crate::messages;
use crate::tasks::{DeleteOutcome, JsonTaskStore, StatusFilter, TaskStore};
use serde::Serialize;
use std::process::ExitCode;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Load settings and run the parsed command line.
pub fn run(cli: Cli) -> CliOutput {
    let settings = match &cli.config {
        Some(path) => Settings::load_file(path),
        None => Settings::load(),
    };
    match settings {
        Ok(settings) => execute(cli.command, &settings, cli.json),
        Err(e) => error_output(format!("Error loading settings: {e}")),
    }
}

/// Run `command` against the data files named in `settings`.
pub fn execute(command: Command, settings: &Settings, json: bool) -> CliOutput {
    let result = match command {
        Command::Task(cmd) => run_task_cmd(cmd, settings, json),
        Command::Note(cmd) => run_note_cmd(cmd, settings, json),
        Command::Connections(cmd) => run_connections_cmd(cmd, settings, json),
        Command::Config { save } => run_config(settings, save.as_deref()),
    };
    result.unwrap_or_else(|e| error_output(format!("Error: {e}")))
}

// === Tasks ===

fn run_task_cmd(cmd: TaskCommand, settings: &Settings, json: bool) -> Result<CliOutput> {
    let store = JsonTaskStore::new(&settings.tasks_db_path)?;

    match cmd {
        TaskCommand::Add { title, description, priority, due_date } => {
            let task = store.create_task(&title, &description, &priority, &due_date)?;
            if json {
                json_output(&task)
            } else {
                Ok(success_output(messages::task_created(&task)))
            }
        }
        TaskCommand::List { status, limit } => {
            let page = store.list_tasks(StatusFilter::parse_or_default(&status), limit)?;
            if json {
                json_output(&page.tasks)
            } else {
                Ok(success_output(messages::task_list(&page)?))
            }
        }
        TaskCommand::Done { id } => match store.complete_task(id) {
            Ok(outcome) => Ok(success_output(messages::task_completion(id, Ok(outcome))?)),
            Err(Error::TaskNotFound(_)) => Ok(error_output(messages::task_not_found(id))),
            Err(e) => Err(e),
        },
        TaskCommand::Rm { id, yes } => match store.delete_task(id, yes) {
            Ok(DeleteOutcome::ConfirmationRequired) => {
                Ok(error_output(format!("Task #{id} not deleted: pass --yes to confirm")))
            }
            Ok(outcome) => Ok(success_output(messages::task_deletion(id, Ok(outcome))?)),
            Err(Error::TaskNotFound(_)) => Ok(error_output(messages::task_not_found(id))),
            Err(e) => Err(e),
        },
        TaskCommand::Search { query } => {
            let tasks = store.search_tasks(&query)?;
            if json {
                json_output(&tasks)
            } else {
                Ok(success_output(messages::task_search(&query, &tasks)?))
            }
        }
    }
}

// === Notes ===

fn run_note_cmd(cmd: NoteCommand, settings: &Settings, json: bool) -> Result<CliOutput> {
    let store = JsonTaskStore::new(&settings.tasks_db_path)?;

    match cmd {
        NoteCommand::Add { title, content, tags } => {
            let note = store.create_note(&title, &content, &tags)?;
            if json {
                json_output(&note)
            } else {
                Ok(success_output(messages::note_created(&note)))
            }
        }
        NoteCommand::List { limit } => {
            let page = store.list_notes(limit)?;
            if json {
                json_output(&page.notes)
            } else {
                Ok(success_output(messages::note_list(&page)?))
            }
        }
    }
}

// === Connections ===

fn run_connections_cmd(
    cmd: ConnectionsCommand,
    settings: &Settings,
    json: bool,
) -> Result<CliOutput> {
    let monitor = ConnectionMonitor::new(&settings.connections_path)?;

    match cmd {
        ConnectionsCommand::List { status } => {
            let status = status.trim().to_lowercase();
            let clients = if status == "all" {
                monitor.all_clients()?
            } else {
                match ClientStatus::parse(&status) {
                    Some(s) => monitor.clients_with_status(Some(s))?,
                    None => Vec::new(),
                }
            };
            if json {
                json_output(&clients)
            } else {
                Ok(success_output(messages::connection_list(&status, &clients)?))
            }
        }
        ConnectionsCommand::Stats => {
            let stats = monitor.stats()?;
            if json {
                json_output(&stats)
            } else {
                Ok(success_output(messages::connection_stats(&stats)?))
            }
        }
        ConnectionsCommand::Show { client_id } => {
            let client = monitor.client(&client_id)?;
            match (client, json) {
                (Some(client), true) => json_output(&client),
                (Some(client), false) => {
                    Ok(success_output(messages::connection_details(&client_id, Some(&client))?))
                }
                (None, _) => Ok(error_output(messages::connection_details(&client_id, None)?)),
            }
        }
        ConnectionsCommand::Cleanup { days } => {
            let removed = monitor.cleanup_old_connections(days)?;
            Ok(success_output(format!("Removed {removed} old connection(s)")))
        }
    }
}

// === Settings ===

fn run_config(settings: &Settings, save: Option<&std::path::Path>) -> Result<CliOutput> {
    let yaml = serde_yaml::to_string(settings)?;
    let mut output = success_output(yaml.trim_end().to_string());
    if let Some(path) = save {
        settings.save_to(path)?;
        output.stderr.push(format!("Settings written to {}", path.display()));
    }
    Ok(output)
}

// === Output helpers ===

fn json_output<T: Serialize + ?Sized>(value: &T) -> Result<CliOutput> {
    Ok(success_output(serde_json::to_string_pretty(value)?))
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}
