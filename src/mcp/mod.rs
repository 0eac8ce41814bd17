//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio exposing the `greet` tool and `greeting_prompt`.

pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod tools;

pub use handler::GreeterHandler;
pub use protocol::{
    methods, GetPromptResult, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer,
    State, ToolCallResult,
};
pub use registry::{Registry, RegistryBuilder};
