//! Greeter - a minimal MCP server
//!
//! Serves one tool (`greet`) and one prompt (`greeting_prompt`) over
//! newline-delimited JSON-RPC on stdin/stdout.

pub mod config;
pub mod error;
pub mod mcp;

pub use config::{LogFormat, ServerConfig};
pub use error::{GreeterError, Result};
