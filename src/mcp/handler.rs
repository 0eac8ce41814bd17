//! Method routing for the greeter server

use serde_json::{json, Value};

use super::protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use super::registry::Registry;
use crate::config::ServerConfig;
use crate::error::{GreeterError, Result};

/// Routes MCP methods onto the registration table
pub struct GreeterHandler {
    registry: Registry,
    config: ServerConfig,
}

impl GreeterHandler {
    pub fn new(registry: Registry, config: ServerConfig) -> Self {
        Self { registry, config }
    }

    fn handle_tool_call(&self, params: &Value) -> Result<Value> {
        let name = target_name(params)?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::debug!(tool = name, "Calling tool");
        let output = self.registry.call_tool(name, arguments)?;
        Ok(json!(ToolCallResult::structured(output)))
    }

    fn handle_get_prompt(&self, params: &Value) -> Result<Value> {
        let name = target_name(params)?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::debug!(prompt = name, "Rendering prompt");
        let result = self.registry.get_prompt(name, arguments)?;
        Ok(json!(result))
    }
}

fn target_name(params: &Value) -> Result<&str> {
    params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GreeterError::MalformedArguments("missing parameter: name".to_string()))
}

impl McpHandler for GreeterHandler {
    fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        let result = match request.method.as_str() {
            methods::INITIALIZE => {
                let requested = request
                    .params
                    .get("protocolVersion")
                    .and_then(|v| v.as_str());
                let result = InitializeResult::new(&self.config, requested);
                tracing::info!(
                    protocol_version = %result.protocol_version,
                    "Client initialized session"
                );
                Ok(json!(result))
            }
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => Ok(json!({"tools": self.registry.tool_definitions()})),
            methods::CALL_TOOL => self.handle_tool_call(&request.params),
            methods::LIST_PROMPTS => {
                Ok(json!({"prompts": self.registry.prompt_definitions()}))
            }
            methods::GET_PROMPT => self.handle_get_prompt(&request.params),
            method if method.starts_with(methods::NOTIFICATION_PREFIX) => {
                tracing::debug!(method, "Notification received");
                return None;
            }
            method => Err(GreeterError::MethodNotFound(method.to_string())),
        };

        Some(match result {
            Ok(value) => McpResponse::success(request.id, value),
            Err(e) => {
                tracing::debug!(method = %request.method, "Request failed: {}", e);
                McpResponse::from_error(request.id, e)
            }
        })
    }
}
