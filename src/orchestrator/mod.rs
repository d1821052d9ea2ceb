//! Query orchestration: the model/tool-call loop for one user query.

use std::sync::Arc;

use futures::future;
use tracing::debug;

use crate::config::{ClientConfig, ToolDispatch, DEFAULT_MAX_ROUNDS};
use crate::error::{MathMcpError, Result};
use crate::mcp::{SessionId, SessionManager, ToolCatalog};
use crate::provider::{ModelProvider, ProviderRequest};
use crate::types::{AgentToolCall, ModelMessage, ToolChoice, Usage};

/// Loop controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Model requests allowed per query.
    pub max_rounds: usize,
    pub dispatch: ToolDispatch,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            dispatch: ToolDispatch::Sequential,
        }
    }
}

impl From<&ClientConfig> for OrchestratorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_rounds: config.max_rounds,
            dispatch: config.dispatch,
        }
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    AwaitingModel,
    ExecutingTools,
    Done,
}

/// Final answer plus the conversation that produced it.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub text: String,
    pub messages: Vec<ModelMessage>,
    /// Model requests made.
    pub rounds: usize,
    pub tool_invocations: usize,
    /// Token usage summed over every round.
    pub usage: Usage,
}

/// Drives one query through the model and the connected tool servers.
pub struct QueryOrchestrator {
    provider: Arc<dyn ModelProvider>,
    config: OrchestratorConfig,
}

impl QueryOrchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>, config: OrchestratorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answer `query`, invoking catalog tools whenever the model asks for
    /// them. Each call starts a fresh conversation.
    pub async fn process_query(
        &self,
        sessions: &SessionManager,
        catalog: &ToolCatalog,
        query: &str,
    ) -> Result<QueryOutcome> {
        let mut messages = vec![ModelMessage::user(query)];
        let mut state = OrchestratorState::AwaitingModel;
        let mut pending: Vec<AgentToolCall> = Vec::new();
        let mut rounds = 0usize;
        let mut tool_invocations = 0usize;
        let mut usage = Usage::default();

        loop {
            debug!(?state, rounds, "orchestrator step");
            match state {
                OrchestratorState::AwaitingModel => {
                    if rounds >= self.config.max_rounds {
                        return Err(MathMcpError::DeadlineExceeded { rounds });
                    }
                    rounds += 1;

                    let request = ProviderRequest {
                        messages: messages.clone(),
                        tools: catalog.definitions().to_vec(),
                        tool_choice: ToolChoice::Auto,
                    };
                    let response = self.provider.generate_text(&request).await?;
                    usage.merge(&response.usage);
                    debug!(
                        provider = self.provider.provider_name(),
                        model = self.provider.model_id(),
                        round = rounds,
                        tool_calls = response.tool_calls.len(),
                        finish_reason = ?response.finish_reason,
                        "model response"
                    );

                    if response.has_tool_calls() {
                        messages.push(ModelMessage::assistant_tool_calls(
                            response.text,
                            response.tool_calls.clone(),
                        ));
                        pending = response.tool_calls;
                        state = OrchestratorState::ExecutingTools;
                    } else {
                        messages.push(ModelMessage::assistant(response.text));
                        state = OrchestratorState::Done;
                    }
                }
                OrchestratorState::ExecutingTools => {
                    let calls = std::mem::take(&mut pending);
                    let routed = route_calls(catalog, &calls)?;
                    let results = self.dispatch(sessions, &routed).await?;

                    tool_invocations += results.len();
                    for (call, text) in calls.iter().zip(results) {
                        messages.push(ModelMessage::tool_result(call.id.clone(), text));
                    }
                    state = OrchestratorState::AwaitingModel;
                }
                OrchestratorState::Done => {
                    let text = messages.last().map(ModelMessage::text).unwrap_or_default();
                    return Ok(QueryOutcome {
                        text,
                        messages,
                        rounds,
                        tool_invocations,
                        usage,
                    });
                }
            }
        }
    }

    async fn dispatch(
        &self,
        sessions: &SessionManager,
        routed: &[(SessionId, &AgentToolCall)],
    ) -> Result<Vec<String>> {
        match self.config.dispatch {
            ToolDispatch::Sequential => {
                let mut results = Vec::with_capacity(routed.len());
                for (session, call) in routed {
                    results.push(invoke(sessions, *session, call).await?);
                }
                Ok(results)
            }
            ToolDispatch::Concurrent => {
                let futures = routed
                    .iter()
                    .map(|(session, call)| invoke(sessions, *session, call));
                future::join_all(futures).await.into_iter().collect()
            }
        }
    }
}

/// Resolve the owning session of every call before anything runs.
fn route_calls<'a>(
    catalog: &ToolCatalog,
    calls: &'a [AgentToolCall],
) -> Result<Vec<(SessionId, &'a AgentToolCall)>> {
    calls
        .iter()
        .map(|call| {
            catalog
                .route(&call.name)
                .map(|session| (session, call))
                .ok_or_else(|| MathMcpError::ToolNotFound(call.name.clone()))
        })
        .collect()
}

async fn invoke(sessions: &SessionManager, session: SessionId, call: &AgentToolCall) -> Result<String> {
    debug!(tool = call.name.as_str(), call_id = call.id.as_str(), %session, "invoking tool");
    let result = sessions
        .call_tool(session, &call.name, call.arguments.clone())
        .await?;
    result.into_model_text(&call.name)
}
