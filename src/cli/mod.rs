//! Command-line surfaces of `mathmcp-client` and `mathmcp-server`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{normalize_path, ClientConfig, ServerConfig, ToolDispatch};
use crate::error::{MathMcpError, Result};
use crate::server::TransportKind;

/// Ask a chat model a question, letting it call tools on MCP servers.
#[derive(Parser, Debug)]
#[command(name = "mathmcp-client", version, about = "MCP tool-calling chat client")]
pub struct ClientCli {
    /// TOML client config (provider, endpoint, credential, model, ...)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server script to launch over stdio (.py or .js); repeatable
    #[arg(long = "stdio", value_name = "SCRIPT")]
    pub stdio: Vec<PathBuf>,

    /// Server command line to launch over stdio, e.g. "mathmcp-server --name Math";
    /// repeatable. Split on whitespace only: quoting is not supported, so no
    /// argument may contain a space.
    #[arg(long = "stdio-command", value_name = "CMD")]
    pub stdio_command: Vec<String>,

    /// URL of a network MCP server, e.g. http://127.0.0.1:9123/sse; repeatable
    #[arg(long = "sse", value_name = "URL")]
    pub sse: Vec<String>,

    /// Model requests allowed per query
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Run the tool calls of one model turn concurrently
    #[arg(long)]
    pub concurrent_tools: bool,

    /// The question to ask
    pub query: String,
}

impl ClientCli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Fail unless at least one server is given.
    pub fn ensure_servers(&self) -> Result<()> {
        if self.stdio.is_empty() && self.stdio_command.is_empty() && self.sse.is_empty() {
            return Err(MathMcpError::InvalidInput(
                "No MCP server given; use --stdio, --stdio-command or --sse".into(),
            ));
        }
        Ok(())
    }

    /// Config file (or environment) with command-line overrides applied.
    pub fn load_client_config(&self) -> Result<ClientConfig> {
        let base = match &self.config {
            Some(path) => ClientConfig::from_toml_file(path)?,
            None => ClientConfig::from_env()?,
        };
        Ok(self.apply_to(base))
    }

    pub fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(rounds) = self.max_rounds {
            config.max_rounds = rounds;
        }
        if self.concurrent_tools {
            config.dispatch = ToolDispatch::Concurrent;
        }
        config
    }
}

/// Split a `--stdio-command` value into program and arguments.
///
/// Splits on whitespace only; quotes are kept as literal characters.
pub fn split_command(raw: &str) -> Result<(String, Vec<String>)> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| MathMcpError::InvalidInput("Empty server command".into()))?;
    Ok((program, parts.collect()))
}

/// Serve the geometric-mean tool over MCP.
#[derive(Parser, Debug)]
#[command(name = "mathmcp-server", version, about = "MCP math tool server")]
pub struct ServerCli {
    /// Transport: stdio or sse (falls back to MCP_CONNECTION_TYPE)
    #[arg(short, long)]
    pub transport: Option<TransportKind>,

    /// Bind host for sse (falls back to MCP_SERVER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port for sse (falls back to MCP_SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// HTTP path of the MCP endpoint (falls back to MCP_SSE_PATH)
    #[arg(long)]
    pub path: Option<String>,

    /// Server name reported to clients (falls back to MCP_SERVER_NAME)
    #[arg(long)]
    pub name: Option<String>,
}

impl ServerCli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Environment settings with command-line overrides applied.
    pub fn load_server_config(&self) -> Result<ServerConfig> {
        Ok(self.apply_to(ServerConfig::from_env()?))
    }

    pub fn apply_to(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.path {
            config.path = normalize_path(path);
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        config
    }
}

/// Install the stderr log subscriber (`RUST_LOG`, default `info`).
///
/// Stdout stays free for the stdio transport and the final answer.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}
