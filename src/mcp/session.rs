//! Lifecycle of every open MCP session on the client side.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{MathMcpError, Result};

use super::catalog::ToolCatalog;
use super::client::{MCPClient, MCPToolCallResult};
use super::schema::MCPToolSchema;
use super::transport::{MCPTransport, SSETransport, StdioTransport};

/// MCP client operations required by the session manager.
#[async_trait]
pub trait MCPClientOps: Send {
    async fn initialize(&mut self) -> Result<()>;
    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult>;
    async fn close(&mut self) -> Result<()>;
    fn is_connected(&self) -> bool;
}

#[async_trait]
impl MCPClientOps for MCPClient {
    async fn initialize(&mut self) -> Result<()> {
        MCPClient::initialize(self).await
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        MCPClient::list_tools(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        MCPClient::call_tool(self, name, arguments).await
    }

    async fn close(&mut self) -> Result<()> {
        MCPClient::close(self).await
    }

    fn is_connected(&self) -> bool {
        MCPClient::is_connected(self)
    }
}

/// Handle of one session, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) usize);

impl SessionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

struct SessionEntry {
    label: String,
    client: Mutex<Box<dyn MCPClientOps>>,
}

/// Owns every connected MCP session until [`SessionManager::close`].
#[derive(Default)]
pub struct SessionManager {
    sessions: Vec<SessionEntry>,
    closed: bool,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch a `.py` or `.js` server script as a subprocess and connect to it
    /// over stdio.
    pub async fn connect_stdio(&mut self, script_path: impl AsRef<Path>) -> Result<SessionId> {
        let path = script_path.as_ref();
        let interpreter = interpreter_for(path)?;
        self.connect_stdio_command(interpreter, vec![path.display().to_string()])
            .await
    }

    /// Launch an arbitrary command and connect to it over stdio.
    pub async fn connect_stdio_command(
        &mut self,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Result<SessionId> {
        let transport = StdioTransport::new(command, args);
        let label = transport.describe();
        self.attach(label, MCPClient::new(Box::new(transport))).await
    }

    /// Connect to a network server at `url`.
    pub async fn connect_sse(&mut self, url: impl Into<String>) -> Result<SessionId> {
        let transport = SSETransport::new(url);
        let label = transport.url().to_string();
        self.attach(label, MCPClient::new(Box::new(transport))).await
    }

    /// Initialize `client` and take ownership of it.
    pub async fn attach(
        &mut self,
        label: impl Into<String>,
        mut client: impl MCPClientOps + 'static,
    ) -> Result<SessionId> {
        let label = label.into();
        if self.closed {
            return Err(MathMcpError::InvalidState(format!(
                "Cannot attach {label}: session manager is closed"
            )));
        }

        client.initialize().await?;
        let id = SessionId(self.sessions.len());
        info!(session = %id, server = label.as_str(), "Connected to MCP server");

        self.sessions.push(SessionEntry {
            label,
            client: Mutex::new(Box::new(client)),
        });
        Ok(id)
    }

    /// Tools offered by one session. An empty listing is not an error.
    pub async fn list_tools(&self, id: SessionId) -> Result<Vec<MCPToolSchema>> {
        let entry = self.entry(id)?;
        let tools = entry.client.lock().await.list_tools().await?;

        if tools.is_empty() {
            info!(session = %id, server = entry.label.as_str(), "No tools available");
        } else {
            info!(
                session = %id,
                server = entry.label.as_str(),
                tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                "Listed tools"
            );
        }
        Ok(tools)
    }

    /// Invoke `name` on one session.
    pub async fn call_tool(
        &self,
        id: SessionId,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        let entry = self.entry(id)?;
        entry.client.lock().await.call_tool(name, arguments).await
    }

    /// List every session in acquisition order and build the tool catalog.
    pub async fn build_catalog(&self) -> Result<ToolCatalog> {
        let mut catalog = ToolCatalog::new();
        for index in 0..self.sessions.len() {
            let id = SessionId(index);
            let tools = self.list_tools(id).await?;
            catalog.add_session_tools(id, &tools)?;
        }
        Ok(catalog)
    }

    pub async fn is_connected(&self, id: SessionId) -> bool {
        if self.closed {
            return false;
        }
        match self.sessions.get(id.0) {
            Some(entry) => entry.client.lock().await.is_connected(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Labels of every session in acquisition order.
    pub fn labels(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.label.as_str()).collect()
    }

    /// Close every session in reverse acquisition order. Failures are logged
    /// and cleanup continues. Calling it twice is a no-op.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for (index, entry) in self.sessions.iter().enumerate().rev() {
            let id = SessionId(index);
            match entry.client.lock().await.close().await {
                Ok(()) => info!(session = %id, server = entry.label.as_str(), "Closed MCP session"),
                Err(error) => warn!(
                    session = %id,
                    server = entry.label.as_str(),
                    %error,
                    "Failed to close MCP session"
                ),
            }
        }
    }

    fn entry(&self, id: SessionId) -> Result<&SessionEntry> {
        if self.closed {
            return Err(MathMcpError::Stream(format!("{id} is closed")));
        }
        self.sessions
            .get(id.0)
            .ok_or_else(|| MathMcpError::InvalidState(format!("Unknown {id}")))
    }
}

/// Interpreter used to launch a server script.
pub fn interpreter_for(path: &Path) -> Result<&'static str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => Ok("python"),
        Some("js") => Ok("node"),
        _ => Err(MathMcpError::InvalidInput(
            "Server script must be a .py or .js file".into(),
        )),
    }
}
