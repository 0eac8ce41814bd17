//! Greeter MCP Server
//!
//! Run with: greeter-server

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use greeter::config::{LogFormat, ServerConfig, DEFAULT_SERVER_NAME, DEFAULT_SERVER_VERSION};
use greeter::mcp::{GreeterHandler, McpServer, Registry};

#[derive(Parser, Debug)]
#[command(name = "greeter-server")]
#[command(about = "MCP server with a greet tool and a greeting prompt")]
struct Args {
    /// Server name reported to clients
    #[arg(long, env = "GREETER_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    server_name: String,

    /// Server version reported to clients
    #[arg(long, env = "GREETER_SERVER_VERSION", default_value = DEFAULT_SERVER_VERSION)]
    server_version: String,

    /// Diagnostic log format
    #[arg(long, env = "GREETER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            name: args.server_name,
            version: args.server_version,
            log_format: args.log_format,
        }
    }
}

/// Initialize logging to stderr (stdout is for MCP protocol)
fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn main() -> ExitCode {
    let config = ServerConfig::from(Args::parse());
    init_logging(config.log_format);

    tracing::info!("Starting MCP server...");

    let registry = match Registry::greeter() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to build registration table: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        name = %config.name,
        version = %config.version,
        "MCP server is ready and listening on stdin/stdout"
    );
    tracing::info!("Available tools: {}", registry.tool_names().join(", "));
    tracing::info!("Available prompts: {}", registry.prompt_names().join(", "));

    let mut server = McpServer::new(GreeterHandler::new(registry, config));

    match server.run() {
        Ok(()) => {
            tracing::info!("Input closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Server failed to run: {}", e);
            ExitCode::FAILURE
        }
    }
}
