//! Error types for the greeter server

use thiserror::Error;

/// Result type alias for greeter operations
pub type Result<T> = std::result::Result<T, GreeterError>;

/// JSON-RPC 2.0 error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Main error type for the greeter server
#[derive(Error, Debug)]
pub enum GreeterError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("Malformed arguments: {0}")]
    MalformedArguments(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GreeterError {
    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            GreeterError::UnknownTool(_)
            | GreeterError::UnknownPrompt(_)
            | GreeterError::MalformedArguments(_) => codes::INVALID_PARAMS,
            GreeterError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            GreeterError::InvalidRequest(_) => codes::INVALID_REQUEST,
            _ => codes::INTERNAL_ERROR,
        }
    }
}
