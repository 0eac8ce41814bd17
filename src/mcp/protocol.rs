//! MCP JSON-RPC protocol implementation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};

use crate::config::ServerConfig;
use crate::error::{codes, GreeterError, Result};

/// MCP JSON-RPC request
///
/// A request without an `id` member is a notification and never gets a
/// response. An explicit `"id": null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl McpRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create error from GreeterError
    pub fn from_error(id: Option<Value>, err: GreeterError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the next request line
    Idle,
    /// Processing exactly one request
    Handling,
    /// Input reached end-of-stream or output failed
    Closed,
}

/// Largest accepted request line, newline excluded
pub const DEFAULT_MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// MCP Server handling stdio communication
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: H,
    state: State,
    max_line_bytes: usize,
}

/// Trait for handling MCP requests
///
/// Returning `None` means no response line is written (notifications).
pub trait McpHandler: Send + Sync {
    fn handle_request(&self, request: McpRequest) -> Option<McpResponse>;
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: State::Idle,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Cap the size of a single request line
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run the server, reading from stdin and writing to stdout
    pub fn run(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());
        let writer = stdout.lock();
        self.serve(reader, writer)
    }

    /// Serve newline-delimited JSON-RPC messages until the reader is exhausted.
    ///
    /// Read failures and lines over the size cap end the session cleanly;
    /// write failures are returned.
    pub fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let mut line = String::new();

        loop {
            self.transition(State::Idle);
            line.clear();
            let limit = self.max_line_bytes as u64 + 1;
            match (&mut reader).take(limit).read_line(&mut line) {
                Ok(0) => break, // EOF
                Ok(n) if n > self.max_line_bytes && !line.ends_with('\n') => {
                    tracing::error!(
                        "Request line exceeds {} bytes, closing input",
                        self.max_line_bytes
                    );
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    self.transition(State::Handling);
                    if let Some(response) = self.process_line(trimmed) {
                        if let Err(e) = write_response(&mut writer, &response) {
                            self.transition(State::Closed);
                            return Err(e);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }

        self.transition(State::Closed);
        Ok(())
    }

    fn process_line(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Discarding unparseable message: {}", e);
                return Some(McpResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        // Keep the id around so shape errors can still be correlated
        let id = value.get("id").cloned();

        let request: McpRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(McpResponse::error(
                    id,
                    codes::INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            if request.is_notification() {
                return None;
            }
            return Some(McpResponse::from_error(
                request.id,
                GreeterError::InvalidRequest(format!(
                    "expected jsonrpc 2.0, got {}",
                    request.jsonrpc
                )),
            ));
        }

        tracing::debug!(method = %request.method, id = ?request.id, "Handling request");
        let notification = request.is_notification();
        let response = self.handler.handle_request(request);
        if notification {
            None
        } else {
            response
        }
    }

    fn transition(&mut self, next: State) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "Dispatcher state change");
            self.state = next;
        }
    }
}

fn write_response<W: Write>(writer: &mut W, response: &McpResponse) -> Result<()> {
    let response_json = serde_json::to_string(response)?;
    writeln!(writer, "{}", response_json)?;
    writer.flush()?;
    Ok(())
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
    pub const LIST_PROMPTS: &str = "prompts/list";
    pub const GET_PROMPT: &str = "prompts/get";

    /// Prefix shared by all client notifications
    pub const NOTIFICATION_PREFIX: &str = "notifications/";
}

/// Protocol revisions this server can speak, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Pick the protocol version to answer `initialize` with
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// MCP tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// MCP prompt definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// MCP initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChangedCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChangedCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl InitializeResult {
    pub fn new(config: &ServerConfig, requested_version: Option<&str>) -> Self {
        Self {
            protocol_version: negotiate_protocol_version(requested_version).to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability {
                    list_changed: false,
                }),
                prompts: Some(ListChangedCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: config.name.clone(),
                version: config.version.clone(),
            },
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a structured result, mirrored as a JSON text block
    pub fn structured(value: Value) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: value.to_string(),
            }],
            structured_content: Some(value),
            is_error: None,
        }
    }
}

/// Prompt fetch result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ToolContent,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: ToolContent::Text { text: text.into() },
        }
    }

    /// Text of the message content
    pub fn text(&self) -> &str {
        match &self.content {
            ToolContent::Text { text } => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        calls: AtomicUsize,
    }

    impl McpHandler for Echo {
        fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(McpResponse::success(
                request.id,
                json!({ "method": request.method }),
            ))
        }
    }

    fn echo() -> McpServer<Echo> {
        McpServer::new(Echo {
            calls: AtomicUsize::new(0),
        })
    }

    fn lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_responses_follow_arrival_order() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"a"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":"two","method":"b"}"#,
            "\n"
        );
        let mut out = Vec::new();
        let mut server = echo();
        server.serve(Cursor::new(input), &mut out).unwrap();

        let responses = lines(&out);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[0]["result"]["method"], json!("a"));
        assert_eq!(responses[1]["id"], json!("two"));
        assert_eq!(server.state(), State::Closed);
    }

    #[test]
    fn test_parse_error_keeps_serving() {
        let input = "not json\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"x\"}\n";
        let mut out = Vec::new();
        echo().serve(Cursor::new(input), &mut out).unwrap();

        let responses = lines(&out);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], json!(-32700));
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["id"], json!(7));
    }

    #[test]
    fn test_notification_gets_no_response() {
        let input = "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n";
        let mut out = Vec::new();
        let mut server = echo();
        server.serve(Cursor::new(input), &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(server.handler().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_id_is_still_a_request() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"tools/call\"}\n";
        let mut out = Vec::new();
        let mut server = echo();
        server.serve(Cursor::new(input), &mut out).unwrap();

        let responses = lines(&out);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert!(responses[0].as_object().unwrap().contains_key("id"));
        assert_eq!(responses[0]["result"]["method"], json!("tools/call"));
    }

    #[test]
    fn test_id_presence() {
        let missing: McpRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m"})).unwrap();
        assert!(missing.is_notification());

        let null: McpRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "m"})).unwrap();
        assert_eq!(null.id, Some(Value::Null));
        assert!(!null.is_notification());
    }

    #[test]
    fn test_oversized_line_closes_input() {
        let big = format!(
            "{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"{}\"}}\n",
            "x".repeat(256)
        );
        let input = format!("{}{{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"b\"}}\n", big);
        let mut out = Vec::new();
        let mut server = echo().with_max_line_bytes(64);
        assert!(server.serve(Cursor::new(input), &mut out).is_ok());
        assert!(out.is_empty());
        assert_eq!(server.handler().calls.load(Ordering::SeqCst), 0);
        assert_eq!(server.state(), State::Closed);
    }

    #[test]
    fn test_line_at_size_cap_is_served() {
        let line = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"a\"}";
        let input = format!("{}\n", line);
        let mut out = Vec::new();
        let mut server = echo().with_max_line_bytes(line.len());
        server.serve(Cursor::new(input), &mut out).unwrap();
        assert_eq!(lines(&out).len(), 1);
    }

    #[test]
    fn test_wrong_jsonrpc_version() {
        let input = "{\"jsonrpc\":\"1.0\",\"id\":3,\"method\":\"x\"}\n";
        let mut out = Vec::new();
        let mut server = echo();
        server.serve(Cursor::new(input), &mut out).unwrap();

        let responses = lines(&out);
        assert_eq!(responses[0]["error"]["code"], json!(-32600));
        assert_eq!(responses[0]["id"], json!(3));
        assert_eq!(server.handler().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_shape_is_correlated() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":9}\n";
        let mut out = Vec::new();
        echo().serve(Cursor::new(input), &mut out).unwrap();

        let responses = lines(&out);
        assert_eq!(responses[0]["error"]["code"], json!(-32600));
        assert_eq!(responses[0]["id"], json!(9));
    }

    #[test]
    fn test_invalid_utf8_closes_cleanly() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"a\"}\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"b\"}\n");

        let mut out = Vec::new();
        let mut server = echo();
        assert!(server.serve(Cursor::new(input), &mut out).is_ok());
        assert_eq!(lines(&out).len(), 1);
        assert_eq!(server.state(), State::Closed);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"a\"}\n";
        let mut server = echo();
        let err = server.serve(Cursor::new(input), BrokenPipe).unwrap_err();
        assert!(matches!(err, GreeterError::Io(_)));
        assert_eq!(server.state(), State::Closed);
    }

    #[test]
    fn test_negotiate_protocol_version() {
        assert_eq!(negotiate_protocol_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_protocol_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_protocol_version(None), "2025-06-18");
    }

    #[test]
    fn test_tool_call_result_shape() {
        let result = ToolCallResult::structured(json!({"greeting": "Ćao Ana"}));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["structuredContent"]["greeting"], json!("Ćao Ana"));
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert_eq!(
            value["content"][0]["text"],
            json!(r#"{"greeting":"Ćao Ana"}"#)
        );
        assert!(value.get("isError").is_none());
    }
}
