//! REST facade for the browser front end.
//!
//! Shares the task store file with the MCP server; the file lock keeps the
//! two processes consistent.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{api_routes, AppState};
pub use server::{build_router, serve};
