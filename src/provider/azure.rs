//! Azure OpenAI provider.

use async_trait::async_trait;
use tracing::debug;

use crate::error::MathMcpError;

use super::http::azure_headers;
use super::openai::{build_request_body, send_chat_request};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

/// Azure OpenAI Service provider.
pub struct AzureOpenAiProvider {
    deployment: String,
    api_key: String,
    url: String,
}

impl AzureOpenAiProvider {
    /// Create with Azure-specific endpoint.
    /// `endpoint`: e.g., "https://myresource.openai.azure.com"
    /// `deployment`: e.g., "gpt-4o"
    /// `api_version`: e.g., "2024-06-01"
    pub fn new(endpoint: String, deployment: String, api_key: String, api_version: String) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );
        Self {
            deployment,
            api_key,
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ModelProvider for AzureOpenAiProvider {
    fn provider_name(&self) -> &str {
        "azure"
    }

    fn model_id(&self) -> &str {
        &self.deployment
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, MathMcpError> {
        let body = build_request_body(None, request);
        debug!(deployment = self.deployment.as_str(), messages = request.messages.len(), "Azure generate_text");
        send_chat_request(&self.url, azure_headers(&self.api_key), &body).await
    }
}
