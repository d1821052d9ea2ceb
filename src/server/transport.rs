//! Transport selection for the math server.

use std::fmt;
use std::str::FromStr;

use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::ServiceExt;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{MathMcpError, Result};

use super::MathServer;

/// How the server exchanges MCP messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Line-delimited JSON-RPC over the process's stdin/stdout.
    #[default]
    Stdio,
    /// Network transport: MCP streamable HTTP, responses streamed as SSE.
    Sse,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = MathMcpError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "sse" => Ok(Self::Sse),
            other => Err(MathMcpError::Configuration(format!(
                "Unsupported transport '{other}'. Use 'stdio' or 'sse'"
            ))),
        }
    }
}

/// Serve the tool registry on the configured transport until the peer
/// disconnects (stdio) or Ctrl-C (network).
pub async fn serve(config: &ServerConfig) -> Result<()> {
    match config.transport {
        TransportKind::Stdio => serve_stdio(config).await,
        TransportKind::Sse => serve_network(config).await,
    }
}

async fn serve_stdio(config: &ServerConfig) -> Result<()> {
    info!(name = config.name.as_str(), "Serving MCP over stdio");

    let running = MathServer::new(config.name.clone())
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| MathMcpError::Stream(format!("MCP server initialize failed: {e}")))?;

    let reason = running
        .waiting()
        .await
        .map_err(|e| MathMcpError::Stream(format!("MCP server task failed: {e}")))?;
    info!(?reason, "stdio session ended");
    Ok(())
}

async fn serve_network(config: &ServerConfig) -> Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        address = %addr,
        path = config.path.as_str(),
        name = config.name.as_str(),
        "Serving MCP over streamable HTTP"
    );

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Router mounting the MCP service at `config.path`.
pub fn router(config: &ServerConfig) -> axum::Router {
    let name = config.name.clone();
    let service = StreamableHttpService::new(
        move || Ok(MathServer::new(name.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    axum::Router::new().nest_service(&config.path, service)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
