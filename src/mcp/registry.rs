//! Registration table mapping tool and prompt identifiers to handlers
//!
//! Built once before the dispatch loop starts and read-only afterwards.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::prompts::{greeting_prompt, greeting_prompt_definition};
use super::protocol::{GetPromptResult, PromptDefinition, ToolDefinition};
use super::tools::{greet, greet_definition};
use crate::error::{GreeterError, Result};

type ToolFn = Box<dyn Fn(Value) -> Result<Value> + Send + Sync>;
type PromptFn = Box<dyn Fn(Option<&HashMap<String, String>>) -> GetPromptResult + Send + Sync>;

struct ToolEntry {
    definition: ToolDefinition,
    handler: ToolFn,
}

struct PromptEntry {
    definition: PromptDefinition,
    handler: PromptFn,
}

/// Immutable identifier -> handler table
pub struct Registry {
    tools: BTreeMap<String, ToolEntry>,
    prompts: BTreeMap<String, PromptEntry>,
}

/// Collects registrations, rejecting duplicate identifiers per category
#[derive(Default)]
pub struct RegistryBuilder {
    tools: BTreeMap<String, ToolEntry>,
    prompts: BTreeMap<String, PromptEntry>,
}

impl RegistryBuilder {
    /// Register a typed tool handler.
    ///
    /// Arguments are decoded into `I` before the handler runs; a decode
    /// failure becomes `MalformedArguments` and the handler is skipped.
    pub fn tool<I, O, F>(mut self, definition: ToolDefinition, handler: F) -> Result<Self>
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        if self.tools.contains_key(&definition.name) {
            return Err(GreeterError::DuplicateRegistration(format!(
                "tool {}",
                definition.name
            )));
        }

        let erased: ToolFn = Box::new(move |arguments| {
            let input: I = serde_json::from_value(arguments)
                .map_err(|e| GreeterError::MalformedArguments(e.to_string()))?;
            Ok(serde_json::to_value(handler(input))?)
        });

        self.tools.insert(
            definition.name.clone(),
            ToolEntry {
                definition,
                handler: erased,
            },
        );
        Ok(self)
    }

    /// Register a prompt generator
    pub fn prompt<F>(mut self, definition: PromptDefinition, handler: F) -> Result<Self>
    where
        F: Fn(Option<&HashMap<String, String>>) -> GetPromptResult + Send + Sync + 'static,
    {
        if self.prompts.contains_key(&definition.name) {
            return Err(GreeterError::DuplicateRegistration(format!(
                "prompt {}",
                definition.name
            )));
        }

        self.prompts.insert(
            definition.name.clone(),
            PromptEntry {
                definition,
                handler: Box::new(handler),
            },
        );
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            tools: self.tools,
            prompts: self.prompts,
        }
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The table served by the greeter binary: `greet` and `greeting_prompt`
    pub fn greeter() -> Result<Self> {
        Ok(Self::builder()
            .tool(greet_definition(), greet)?
            .prompt(greeting_prompt_definition(), greeting_prompt)?
            .build())
    }

    /// Invoke a tool by identifier with raw JSON arguments
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| GreeterError::UnknownTool(name.to_string()))?;
        (entry.handler)(arguments)
    }

    /// Render a prompt by identifier. `arguments` may be null or an object of strings.
    pub fn get_prompt(&self, name: &str, arguments: Value) -> Result<GetPromptResult> {
        let entry = self
            .prompts
            .get(name)
            .ok_or_else(|| GreeterError::UnknownPrompt(name.to_string()))?;

        let arguments: Option<HashMap<String, String>> = serde_json::from_value(arguments)
            .map_err(|e| GreeterError::MalformedArguments(e.to_string()))?;
        Ok((entry.handler)(arguments.as_ref()))
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn prompt_names(&self) -> Vec<&str> {
        self.prompts.keys().map(String::as_str).collect()
    }

    pub fn tool_definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.values().map(|e| &e.definition).collect()
    }

    pub fn prompt_definitions(&self) -> Vec<&PromptDefinition> {
        self.prompts.values().map(|e| &e.definition).collect()
    }
}
