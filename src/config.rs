//! Server configuration

use serde::{Deserialize, Serialize};

/// Default server name advertised during `initialize`
pub const DEFAULT_SERVER_NAME: &str = "greeter";

/// Default server version advertised during `initialize`
pub const DEFAULT_SERVER_VERSION: &str = "v0.0.1";

/// Log output format for the diagnostic stream
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Runtime configuration for the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: DEFAULT_SERVER_VERSION.to_string(),
            log_format: LogFormat::Text,
        }
    }
}
