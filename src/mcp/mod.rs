//! MCP (Model Context Protocol) server.
//!
//! Exposes the task, filesystem and connection tools over stdio.

pub mod assistant_server;

pub use assistant_server::AssistantServer;
