//! CLI binary for `personal_mcp`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the
//! library.

use clap::Parser;
use personal_mcp::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let output = run(Cli::parse());

    for msg in output.stdout {
        println!("{msg}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}
