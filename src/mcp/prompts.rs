//! The `greeting_prompt` prompt

use std::collections::HashMap;

use super::protocol::{GetPromptResult, PromptArgument, PromptDefinition, PromptMessage};

/// Identifier the prompt is registered under
pub const GREETING_PROMPT: &str = "greeting_prompt";

/// Name used when the caller does not supply one
pub const DEFAULT_NAME: &str = "there";

const DESCRIPTION_PREFIX: &str = "A prompt that teaches how to use the greet tool for ";

/// Render the instructional text for `name`.
///
/// `name` is inserted verbatim. The `{"name": ...}` fragment is prose, so a
/// name containing a double quote yields text that is not valid JSON.
pub fn greeting_text(name: &str) -> String {
    format!(
        "You are a friendly assistant with access to a 'greet' tool that can generate personalized greeting messages. \
         When users want to greet someone, suggest using the greet tool with the person's name. \
         For example, you can use the greet tool by calling it with: {{\"name\": \"{name}\"}}. \
         Generate a warm response for {name} that explains how they can use the greet tool. \
         Make your explanation welcoming and suitable for both casual and business contexts."
    )
}

/// Generate the prompt, defaulting the name to "there"
pub fn greeting_prompt(arguments: Option<&HashMap<String, String>>) -> GetPromptResult {
    let name = arguments
        .and_then(|args| args.get("name"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_NAME);

    GetPromptResult {
        description: format!("{}{}", DESCRIPTION_PREFIX, name),
        messages: vec![PromptMessage::user(greeting_text(name))],
    }
}

/// Prompt definition advertised by `prompts/list`
pub fn greeting_prompt_definition() -> PromptDefinition {
    PromptDefinition {
        name: GREETING_PROMPT.to_string(),
        description: "A prompt that explains how to use the greet tool effectively".to_string(),
        arguments: vec![PromptArgument {
            name: "name".to_string(),
            description: "the name of the person to greet".to_string(),
            required: false,
        }],
    }
}
