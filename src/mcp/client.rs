//! MCP client for connecting to MCP servers.

use crate::error::MathMcpError;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientInfo, Content, Implementation, JsonObject,
        ResourceContents,
    },
    service::{ClientInitializeError, ServiceError},
};
use tracing::debug;

use super::schema::MCPToolSchema;
pub use super::transport::MCPRunningService;
use super::transport::MCPTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCPConnectionState {
    Disconnected,
    Connected,
    Initialized,
    Closed,
}

/// Typed result of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MCPToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl MCPToolCallResult {
    /// Text handed back to the model: the text content, else the structured
    /// content serialized as JSON.
    pub fn into_model_text(self, tool_name: &str) -> Result<String, MathMcpError> {
        if let Some(text) = self.text_content {
            return Ok(text);
        }
        if let Some(structured) = self.structured_content {
            return Ok(structured.to_string());
        }
        Err(MathMcpError::MalformedToolResult {
            tool_name: tool_name.to_string(),
        })
    }
}

/// Client for a Model Context Protocol server.
pub struct MCPClient {
    transport: Option<Box<dyn MCPTransport>>,
    session: Option<MCPRunningService>,
    state: MCPConnectionState,
}

impl MCPClient {
    /// Create a new MCP client with the given transport.
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport: Some(transport),
            session: None,
            state: MCPConnectionState::Disconnected,
        }
    }

    /// Create a client from an already-running rmcp service.
    ///
    /// Initialization handshake is already handled by rmcp `serve(...)`.
    pub fn from_running_service(session: MCPRunningService) -> Self {
        Self {
            transport: None,
            session: Some(session),
            state: MCPConnectionState::Connected,
        }
    }

    /// Convert an rmcp initialization result into an MCP client.
    pub fn from_running_service_result(
        result: Result<MCPRunningService, ClientInitializeError>,
    ) -> Result<Self, MathMcpError> {
        result
            .map(Self::from_running_service)
            .map_err(map_client_initialize_error)
    }

    pub fn is_initialized(&self) -> bool {
        self.state == MCPConnectionState::Initialized
    }

    /// Whether the session is initialized and its service task still runs.
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state,
            MCPConnectionState::Connected | MCPConnectionState::Initialized
        ) && self.session.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Name reported by the server during the handshake.
    pub fn server_name(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.peer_info())
            .map(|info| info.server_info.name.clone())
    }

    /// Initialize the MCP connection, opening the transport if needed.
    pub async fn initialize(&mut self) -> Result<(), MathMcpError> {
        match self.state {
            MCPConnectionState::Initialized => return Ok(()),
            MCPConnectionState::Closed => {
                return Err(MathMcpError::Stream("MCP session is closed".into()))
            }
            _ => {}
        }

        if self.session.is_none() {
            let Some(transport) = self.transport.as_mut() else {
                return Err(MathMcpError::Configuration("Missing MCP session".into()));
            };
            debug!(endpoint = transport.describe().as_str(), "MCP connect");
            let session = transport
                .connect(client_info())
                .await
                .map_err(map_client_initialize_error)?;
            self.session = Some(session);
            self.state = MCPConnectionState::Connected;
        }

        let Some(session) = self.session.as_ref() else {
            return Err(MathMcpError::Configuration("Missing MCP session".into()));
        };

        if session.is_closed() {
            self.state = MCPConnectionState::Closed;
            return Err(MathMcpError::Stream("MCP session is closed".into()));
        }

        self.state = MCPConnectionState::Initialized;
        Ok(())
    }

    /// List available tools from the MCP server.
    pub async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, MathMcpError> {
        self.ensure_initialized()?;
        let session = self.session_ref()?;

        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                let page = session
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error("list_tools", e))?;
                page.tools
            }
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        Ok(tools.into_iter().map(MCPToolSchema::from).collect())
    }

    /// Execute a tool on the MCP server.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult, MathMcpError> {
        self.ensure_initialized()?;
        let session = self.session_ref()?;
        let arguments = coerce_tool_arguments(arguments)?;

        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        map_call_result(name, result)
    }

    /// Cancel the session. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<(), MathMcpError> {
        if self.state == MCPConnectionState::Closed {
            return Ok(());
        }
        self.state = MCPConnectionState::Closed;
        self.transport = None;

        if let Some(session) = self.session.take() {
            session
                .cancel()
                .await
                .map_err(|e| MathMcpError::Stream(format!("MCP session shutdown failed: {e}")))?;
        }
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), MathMcpError> {
        match self.state {
            MCPConnectionState::Initialized => Ok(()),
            MCPConnectionState::Closed => Err(MathMcpError::Stream("MCP session is closed".into())),
            _ => Err(MathMcpError::InvalidState(
                "MCP client must be initialized first".into(),
            )),
        }
    }

    fn session_ref(&mut self) -> Result<&mut MCPRunningService, MathMcpError> {
        self.session
            .as_mut()
            .ok_or_else(|| MathMcpError::Configuration("Missing MCP session".into()))
    }
}

fn client_info() -> ClientInfo {
    let mut info = ClientInfo::default();
    info.client_info = Implementation::from_build_env();
    info
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>, MathMcpError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                MathMcpError::InvalidInput(format!("MCP tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(MathMcpError::InvalidInput(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<MCPToolCallResult, MathMcpError> {
    let text_content = extract_text_content(&result.content);
    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect::<Vec<_>>();

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| text_content.clone())
            .unwrap_or_else(|| "MCP tool returned an error result".into());

        return Err(MathMcpError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    Ok(MCPToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

fn map_client_initialize_error(error: ClientInitializeError) -> MathMcpError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            MathMcpError::Stream(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => MathMcpError::Stream(format!(
            "MCP initialize transport error ({context}): {error}"
        )),
        ClientInitializeError::JsonRpcError(error) => MathMcpError::Provider {
            provider: "mcp".into(),
            message: format!(
                "MCP initialize JSON-RPC error {}: {}",
                error.code.0, error.message
            ),
        },
        ClientInitializeError::Cancelled => MathMcpError::Stream("MCP initialize cancelled".into()),
        other => MathMcpError::Provider {
            provider: "mcp".into(),
            message: format!("MCP initialize error: {other}"),
        },
    }
}

fn map_service_error(context: &str, error: ServiceError) -> MathMcpError {
    match error {
        ServiceError::McpError(error) => MathMcpError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP error {}: {}", error.code.0, error.message),
        },
        ServiceError::TransportSend(error) => {
            MathMcpError::Stream(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            MathMcpError::Stream(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => MathMcpError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: unexpected MCP response"),
        },
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            MathMcpError::Stream(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => MathMcpError::Timeout(timeout.as_millis() as u64),
        other => MathMcpError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP service error: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::transport::StdioTransport;
    use crate::server::MathServer;
    use rmcp::ServiceExt;
    use serde_json::json;
    use std::time::Duration;

    async fn in_process_client() -> MCPClient {
        let (server_io, client_io) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            if let Ok(running) = MathServer::new("MathematicalTools").serve(server_io).await {
                let _ = running.waiting().await;
            }
        });
        MCPClient::from_running_service_result(client_info().into_dyn().serve(client_io).await)
            .expect("client handshake")
    }

    #[test]
    fn coerce_tool_arguments_accepts_object_and_stringified_object() {
        let from_obj = coerce_tool_arguments(json!({"values": [1, 2]}))
            .expect("object arguments should parse")
            .expect("object should be present");
        assert_eq!(from_obj.get("values"), Some(&json!([1, 2])));

        let from_str = coerce_tool_arguments(json!(r#"{"values":[3]}"#))
            .expect("stringified object should parse")
            .expect("object should be present");
        assert_eq!(from_str.get("values"), Some(&json!([3])));
    }

    #[test]
    fn coerce_tool_arguments_rejects_non_object() {
        let err =
            coerce_tool_arguments(json!(["bad"])).expect_err("array arguments should be rejected");
        assert!(matches!(err, MathMcpError::InvalidInput(_)));
    }

    #[test]
    fn coerce_tool_arguments_rejects_malformed_json_string() {
        let err = coerce_tool_arguments(json!(r#"{"values":[1"#))
            .expect_err("malformed JSON string should be rejected");
        assert!(
            matches!(err, MathMcpError::InvalidInput(message) if message.contains("valid JSON"))
        );
    }

    #[tokio::test]
    async fn list_tools_requires_initialize() {
        let mut client = MCPClient::new(Box::new(StdioTransport::new("unused", Vec::new())));
        let err = client
            .list_tools()
            .await
            .expect_err("listing tools should require initialize");
        assert!(matches!(err, MathMcpError::InvalidState(_)));
    }

    #[test]
    fn map_service_error_timeout_maps_to_timeout_error() {
        let err = map_service_error(
            "call_tool",
            ServiceError::Timeout {
                timeout: Duration::from_millis(2750),
            },
        );
        assert!(matches!(err, MathMcpError::Timeout(2750)));
    }

    #[test]
    fn map_service_error_cancelled_reason_is_preserved() {
        let err = map_service_error(
            "call_tool",
            ServiceError::Cancelled {
                reason: Some("client cancelled".into()),
            },
        );
        assert!(matches!(
            err,
            MathMcpError::Stream(message) if message.contains("client cancelled")
        ));
    }

    #[test]
    fn from_running_service_result_maps_jsonrpc_initialize_error() {
        let init_error = ClientInitializeError::JsonRpcError(
            rmcp::model::ErrorData::invalid_request("bad initialize payload", None),
        );
        let err = match MCPClient::from_running_service_result(Err(init_error)) {
            Ok(_) => panic!("initialize error should be mapped"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            MathMcpError::Provider { provider, message }
            if provider == "mcp" && message.contains("bad initialize payload")
        ));
    }

    #[test]
    fn map_call_result_returns_tool_execution_error_for_error_payload() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "All values must be positive for geometric mean calculation" }
            ],
            "isError": true
        }))
        .expect("fixture call result should deserialize");

        let err = map_call_result("calculate_geometric_mean", result)
            .expect_err("error result should map to tool execution error");
        assert!(matches!(
            err,
            MathMcpError::ToolExecution { tool_name, message }
            if tool_name == "calculate_geometric_mean" && message.contains("must be positive")
        ));
    }

    #[test]
    fn model_text_prefers_text_then_structured_content() {
        let text = MCPToolCallResult {
            structured_content: Some(json!({"mean": 6.0})),
            text_content: Some("6".into()),
            content: Vec::new(),
        };
        assert_eq!(text.into_model_text("t").unwrap(), "6");

        let structured = MCPToolCallResult {
            structured_content: Some(json!({"mean": 6.0})),
            text_content: None,
            content: Vec::new(),
        };
        assert_eq!(structured.into_model_text("t").unwrap(), r#"{"mean":6.0}"#);

        let empty = MCPToolCallResult {
            structured_content: None,
            text_content: None,
            content: vec![json!({"type": "image"})],
        };
        assert!(matches!(
            empty.into_model_text("t"),
            Err(MathMcpError::MalformedToolResult { tool_name }) if tool_name == "t"
        ));
    }

    #[tokio::test]
    async fn in_process_session_lists_calls_and_closes() {
        let mut client = in_process_client().await;
        client.initialize().await.expect("initialize");
        assert!(client.is_connected());
        assert_eq!(client.server_name().as_deref(), Some("MathematicalTools"));

        let tools = client.list_tools().await.expect("list tools");
        assert_eq!(tools[0].name, "calculate_geometric_mean");

        let result = client
            .call_tool("calculate_geometric_mean", json!({"values": [4, 9]}))
            .await
            .expect("call tool");
        assert_eq!(result.text_content.as_deref(), Some("6.0"));

        client.close().await.expect("close");
        client.close().await.expect("second close is a no-op");
        assert!(!client.is_connected());
        let err = client
            .call_tool("calculate_geometric_mean", json!({"values": [1]}))
            .await
            .expect_err("closed session rejects calls");
        assert!(matches!(err, MathMcpError::Stream(message) if message.contains("closed")));
    }
}
