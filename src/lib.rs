//! # `personal_mcp`
//!
//! A personal assistant exposed to AI clients over the Model Context
//! Protocol: tasks and notes in a JSON store, sandboxed file access, and a
//! record of which clients have connected. A REST facade and a CLI work on
//! the same data files.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod connections;
pub mod error;
pub mod filesystem;
pub mod json_file;
pub mod logging;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod messages;
pub mod paths;
pub mod tasks;
pub mod templates;
pub mod time;
pub mod tools;
pub mod validation;
#[cfg(feature = "web")]
pub mod web;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
