//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::MathMcpError;
use crate::types::*;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, MathMcpError> {
        let body = build_request_body(Some(&self.model), request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = self.model.as_str(), messages = request.messages.len(), "OpenAI generate_text");

        send_chat_request(&url, bearer_headers(&self.api_key), &body).await
    }
}

/// Build a chat-completions body. Azure deployments omit `model`.
pub(crate) fn build_request_body(model: Option<&str>, request: &ProviderRequest) -> serde_json::Value {
    let messages = request
        .messages
        .iter()
        .map(message_to_openai)
        .collect::<Vec<_>>();

    let mut body = serde_json::json!({ "messages": messages });
    if let Some(model) = model {
        body["model"] = model.into();
    }

    if !request.tools.is_empty() {
        let tool_defs: Vec<serde_json::Value> =
            request.tools.iter().map(|t| t.to_openai_json()).collect();
        body["tools"] = tool_defs.into();
        body["tool_choice"] = request.tool_choice.as_str().into();
    }

    body
}

/// POST a chat-completions body and decode the first choice.
pub(crate) async fn send_chat_request(
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<ProviderResponse, MathMcpError> {
    let resp = shared_client()
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await?;

    let status = resp.status().as_u16();
    if status != 200 {
        let body_text = resp.text().await.unwrap_or_default();
        return Err(status_to_error(status, &body_text));
    }

    let data: OpenAiChatResponse = resp.json().await?;
    parse_chat_response(data)
}

fn parse_chat_response(data: OpenAiChatResponse) -> Result<ProviderResponse, MathMcpError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| MathMcpError::api(200, "No choices in chat completion response"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| AgentToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: serde_json::from_str(&tc.function.arguments)
                .unwrap_or(serde_json::Value::String(tc.function.arguments)),
        })
        .collect();

    Ok(ProviderResponse {
        text: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::parse),
        usage: data
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default(),
    })
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    if let Some(result) = msg.tool_result_part() {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": result.text,
        });
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": arguments_string(&tc.arguments),
                    }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

// Undecodable arguments were kept as the raw string; send them back verbatim.
fn arguments_string(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
