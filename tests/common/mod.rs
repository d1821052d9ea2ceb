//! Shared test helpers: a scripted model provider, a counting MCP client and
//! an in-process math server session.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::ServiceExt;

use mathmcp::error::{MathMcpError, Result};
use mathmcp::mcp::{MCPClient, MCPClientOps, MCPToolCallResult, MCPToolSchema};
use mathmcp::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use mathmcp::server::MathServer;
use mathmcp::types::*;

/// A mock provider that returns canned responses and records every request.
pub struct MockProvider {
    model_id: String,
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        });
    }

    /// Queue a response requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls(&[(id, name, args)]);
    }

    /// Queue a response requesting several tool calls, in this order.
    pub fn queue_tool_calls(&self, calls: &[(&str, &str, serde_json::Value)]) {
        self.responses.lock().unwrap().push(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            tool_calls: calls
                .iter()
                .map(|(id, name, args)| AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: args.clone(),
                })
                .collect(),
            finish_reason: Some(FinishReason::ToolCalls),
        });
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ProviderResponse {
                text: "Mock response".to_string(),
                usage: Usage::default(),
                tool_calls: vec![],
                finish_reason: Some(FinishReason::Stop),
            });
        }
        Ok(responses.remove(0))
    }
}

/// Shared log of tool invocations across fake clients.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// What a [`CountingClient`] answers for a tool call.
#[derive(Clone)]
pub enum FakeReply {
    Text(String),
    Empty,
    Fail(String),
}

/// An MCP client double that answers every call with a fixed reply and logs
/// `"<label>:<tool>"`.
pub struct CountingClient {
    label: String,
    tools: Vec<MCPToolSchema>,
    reply: FakeReply,
    delay: Option<Duration>,
    connected: bool,
    log: CallLog,
}

impl CountingClient {
    pub fn new(label: &str, tools: &[&str], reply: FakeReply, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            tools: tools
                .iter()
                .map(|name| MCPToolSchema {
                    name: name.to_string(),
                    description: Some(format!("{name} tool")),
                    input_schema: serde_json::json!({
                        "type": "object",
                        "properties": {"values": {"type": "array", "items": {"type": "number"}}},
                    }),
                })
                .collect(),
            reply,
            delay: None,
            connected: false,
            log: log.clone(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl MCPClientOps for CountingClient {
    async fn initialize(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        _arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.push(format!("{}:{name}", self.label));
        match &self.reply {
            FakeReply::Text(text) => Ok(MCPToolCallResult {
                structured_content: None,
                text_content: Some(text.clone()),
                content: Vec::new(),
            }),
            FakeReply::Empty => Ok(MCPToolCallResult {
                structured_content: None,
                text_content: None,
                content: Vec::new(),
            }),
            FakeReply::Fail(message) => Err(MathMcpError::ToolExecution {
                tool_name: name.to_string(),
                message: message.clone(),
            }),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// The real math server behind an in-memory duplex pipe.
pub async fn math_server_client() -> MCPClient {
    let (server_io, client_io) = tokio::io::duplex(8192);
    tokio::spawn(async move {
        if let Ok(running) = MathServer::new("MathematicalTools").serve(server_io).await {
            let _ = running.waiting().await;
        }
    });
    MCPClient::from_running_service_result(
        rmcp::model::ClientInfo::default().into_dyn().serve(client_io).await,
    )
    .expect("in-process MCP handshake")
}
