//! The `greet` tool

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::protocol::ToolDefinition;

/// Identifier the tool is registered under
pub const GREET_TOOL: &str = "greet";

/// Prefix prepended to every greeting
pub const GREETING_PREFIX: &str = "Ćao ";

const GREET_DESCRIPTION: &str = "Generate a personalized greeting message";

const GREET_INPUT_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "name": {"type": "string", "description": "the name of the person to greet"}
    },
    "required": ["name"]
}"#;

const GREET_OUTPUT_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "greeting": {"type": "string", "description": "the greeting to tell to the user"}
    },
    "required": ["greeting"]
}"#;

/// Input of the `greet` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetInput {
    pub name: String,
}

/// Output of the `greet` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetOutput {
    pub greeting: String,
}

/// Build the greeting for `input.name`, keeping the name byte-for-byte.
pub fn greet(input: GreetInput) -> GreetOutput {
    GreetOutput {
        greeting: format!("{}{}", GREETING_PREFIX, input.name),
    }
}

/// Tool definition advertised by `tools/list`
pub fn greet_definition() -> ToolDefinition {
    ToolDefinition {
        name: GREET_TOOL.to_string(),
        description: GREET_DESCRIPTION.to_string(),
        input_schema: serde_json::from_str(GREET_INPUT_SCHEMA).unwrap_or(json!({})),
        output_schema: serde_json::from_str(GREET_OUTPUT_SCHEMA).ok(),
    }
}
