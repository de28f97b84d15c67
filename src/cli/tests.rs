//! Tests for the CLI module.

use super::*;
use crate::config::Settings;
use crate::connections::ConnectionMonitor;
use clap::Parser;
use std::process::ExitCode;
use tempfile::TempDir;

fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        tasks_db_path: dir.path().join("tasks.json"),
        connections_path: dir.path().join("connections.json"),
        ..Settings::default()
    }
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("personal-mcp").chain(args.iter().copied())).unwrap()
}

fn exec(settings: &Settings, args: &[&str]) -> CliOutput {
    let cli = parse(args);
    execute(cli.command, settings, cli.json)
}

#[test]
fn test_parse_task_add() {
    let cli = parse(&["task", "add", "Pay rent", "--priority", "high", "--due", "friday"]);
    match cli.command {
        Command::Task(TaskCommand::Add { title, description, priority, due_date }) => {
            assert_eq!(title, "Pay rent");
            assert!(description.is_empty());
            assert_eq!(priority, "high");
            assert_eq!(due_date, "friday");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_defaults() {
    let cli = parse(&["task", "list"]);
    assert!(!cli.json);
    assert!(matches!(
        cli.command,
        Command::Task(TaskCommand::List { ref status, limit: 20 }) if status == "all"
    ));

    let cli = parse(&["--json", "note", "list"]);
    assert!(cli.json);
    assert!(matches!(cli.command, Command::Note(NoteCommand::List { limit: 10 })));
}

#[test]
fn test_parse_rejects_non_numeric_id() {
    assert!(Cli::try_parse_from(["personal-mcp", "task", "done", "abc"]).is_err());
}

#[test]
fn test_task_add_and_done() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);

    let out = exec(&settings, &["task", "add", "Pay rent", "-p", "high"]);
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert_eq!(out.stdout, vec!["Task #1 'Pay rent' created successfully"]);

    let out = exec(&settings, &["task", "done", "1"]);
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert!(out.stdout[0].contains("marked as completed"));

    let out = exec(&settings, &["task", "done", "5"]);
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert_eq!(out.stderr, vec!["Task #5 not found"]);
}

#[test]
fn test_task_add_validation_error() {
    let dir = TempDir::new().unwrap();
    let out = exec(&test_settings(&dir), &["task", "add", "   "]);
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert!(out.stderr[0].starts_with("Error: "));
}

#[test]
fn test_task_rm_requires_yes() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    exec(&settings, &["task", "add", "Temp"]);

    let out = exec(&settings, &["task", "rm", "1"]);
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert!(out.stderr[0].contains("--yes"));

    let out = exec(&settings, &["task", "rm", "1", "--yes"]);
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert_eq!(out.stdout, vec!["Task #1 'Temp' permanently deleted"]);
}

#[test]
fn test_task_list_json() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    exec(&settings, &["task", "add", "Low", "-p", "low"]);
    exec(&settings, &["task", "add", "High", "-p", "high"]);

    let out = exec(&settings, &["--json", "task", "list"]);
    let tasks: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(tasks[0]["title"], "High");
    assert_eq!(tasks[1]["title"], "Low");
}

#[test]
#[serial_test::serial]
fn test_task_list_text() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);

    let out = exec(&settings, &["task", "list", "--status", "pending"]);
    assert_eq!(out.stdout, vec!["No tasks found with status 'pending'"]);

    exec(&settings, &["task", "add", "Water plants"]);
    let out = exec(&settings, &["task", "list"]);
    assert!(out.stdout[0].contains("Water plants"), "{}", out.stdout[0]);
}

#[test]
fn test_task_search_json() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    exec(&settings, &["task", "add", "Buy milk"]);
    exec(&settings, &["task", "add", "Walk dog"]);

    let out = exec(&settings, &["--json", "task", "search", "MILK"]);
    let tasks: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
}

#[test]
fn test_note_add_json() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    let out = exec(&settings, &["--json", "note", "add", "Idea", "A shed", "--tags", "home,,diy"]);
    let note: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(note["tags"], serde_json::json!(["home", "diy"]));
}

#[test]
fn test_connections_show_and_cleanup() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    let monitor = ConnectionMonitor::new(&settings.connections_path).unwrap();
    monitor.register_client("desk", "Desktop").unwrap();

    let out = exec(&settings, &["--json", "connections", "show", "desk"]);
    let client: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(client["client_name"], "Desktop");

    let out = exec(&settings, &["connections", "show", "nobody"]);
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert_eq!(out.stderr, vec!["Client not found: nobody"]);

    let out = exec(&settings, &["connections", "cleanup"]);
    assert_eq!(out.stdout, vec!["Removed 0 old connection(s)"]);
}

#[test]
fn test_connections_list_unknown_status() {
    let dir = TempDir::new().unwrap();
    let out = exec(&test_settings(&dir), &["connections", "list", "--status", "asleep"]);
    assert_eq!(out.stdout, vec!["No connections found with status: asleep"]);
}

#[test]
fn test_config_prints_and_saves() {
    let dir = TempDir::new().unwrap();
    let settings = test_settings(&dir);
    let target = dir.path().join("saved.yaml");

    let out = exec(&settings, &["config", "--save", target.to_str().unwrap()]);
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert!(out.stdout[0].contains("port: 5000"));
    assert_eq!(Settings::load_from(&target).unwrap(), settings);
}

#[test]
fn test_run_with_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.yaml");
    let cli = parse(&["--config", missing.to_str().unwrap(), "task", "list"]);
    let out = run(cli);
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert!(out.stderr[0].starts_with("Error loading settings"));
}
