//! Configuration for the tool server and the chat client.
//!
//! Resolution order: CLI flags > config file > environment (`.env` is loaded
//! when present) > built-in defaults.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{MathMcpError, Result};
use crate::provider::ModelProvider;
use crate::server::transport::TransportKind;

pub const DEFAULT_SERVER_NAME: &str = "MathematicalTools";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9123;
pub const DEFAULT_SSE_PATH: &str = "/sse";

pub const DEFAULT_MODEL: &str = "gpt-35-turbo";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Settings for `mathmcp-server`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            transport: TransportKind::Stdio,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_SSE_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from `MCP_CONNECTION_TYPE`, `MCP_SERVER_HOST`, `MCP_SERVER_PORT`,
    /// `MCP_SSE_PATH` and `MCP_SERVER_NAME`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(transport) = lookup("MCP_CONNECTION_TYPE") {
            config.transport = transport.parse()?;
        }
        if let Some(host) = lookup("MCP_SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("MCP_SERVER_PORT") {
            config.port = parse_port(&port)?;
        }
        if let Some(path) = lookup("MCP_SSE_PATH") {
            config.path = path;
        }
        if let Some(name) = lookup("MCP_SERVER_NAME") {
            config.name = name;
        }

        config.path = normalize_path(&config.path);
        Ok(config)
    }

    /// `host:port` to bind for the network transport.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .map_err(|_| MathMcpError::Configuration(format!("Invalid port '{raw}'")))
}

pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_SSE_PATH.to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Chat-completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "openai")]
    OpenAi,
}

/// How the tool calls of one model turn are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolDispatch {
    /// One call at a time, in model order.
    #[default]
    Sequential,
    /// All calls of a turn at once; results still appended in model order.
    Concurrent,
}

/// Settings for the query orchestrator and its model provider.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub provider: ProviderKind,
    pub endpoint: Option<String>,
    pub credential: Option<String>,
    pub model: String,
    pub api_version: Option<String>,
    pub max_rounds: usize,
    pub dispatch: ToolDispatch,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("max_rounds", &self.max_rounds)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Azure,
            endpoint: None,
            credential: None,
            model: DEFAULT_MODEL.to_string(),
            api_version: Some(DEFAULT_AZURE_API_VERSION.to_string()),
            max_rounds: DEFAULT_MAX_ROUNDS,
            dispatch: ToolDispatch::Sequential,
        }
    }
}

impl ClientConfig {
    /// Load from environment variables.
    ///
    /// Azure (`AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
    /// `AZURE_OPENAI_DEPLOYMENT`, `AZURE_OPENAI_API_VERSION`) wins when an
    /// endpoint is set; otherwise `OPENAI_API_KEY`, `OPENAI_BASE_URL` and
    /// `OPENAI_MODEL` select the OpenAI provider.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            config.provider = ProviderKind::Azure;
            config.endpoint = Some(endpoint);
            config.credential = lookup("AZURE_OPENAI_API_KEY");
            if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT") {
                config.model = deployment;
            }
            if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
                config.api_version = Some(version);
            }
        } else if let Some(key) = lookup("OPENAI_API_KEY") {
            config.provider = ProviderKind::OpenAi;
            config.credential = Some(key);
            config.endpoint = lookup("OPENAI_BASE_URL");
            config.api_version = None;
            if let Some(model) = lookup("OPENAI_MODEL") {
                config.model = model;
            }
        }

        if let Some(rounds) = lookup("MATHMCP_MAX_ROUNDS") {
            config.max_rounds = rounds.trim().parse().map_err(|_| {
                MathMcpError::Configuration(format!("Invalid MATHMCP_MAX_ROUNDS '{rounds}'"))
            })?;
        }

        Ok(config)
    }

    /// Parse a TOML document; omitted keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| MathMcpError::Configuration(format!("Invalid client config: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MathMcpError::Configuration(format!(
                "Cannot read client config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check that the provider can be built from this config.
    pub fn validate(&self) -> Result<()> {
        if self.credential.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(MathMcpError::Configuration(match self.provider {
                ProviderKind::Azure => "Missing AZURE_OPENAI_API_KEY".into(),
                ProviderKind::OpenAi => "Missing OPENAI_API_KEY".into(),
            }));
        }
        if self.model.trim().is_empty() {
            return Err(MathMcpError::Configuration("Model must not be empty".into()));
        }
        if self.max_rounds == 0 {
            return Err(MathMcpError::Configuration(
                "max_rounds must be at least 1".into(),
            ));
        }
        if self.provider == ProviderKind::Azure {
            if self.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
                return Err(MathMcpError::Configuration(
                    "Missing AZURE_OPENAI_ENDPOINT".into(),
                ));
            }
            if self.api_version.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(MathMcpError::Configuration(
                    "Azure requires an api_version".into(),
                ));
            }
        }
        Ok(())
    }

    /// Build the model provider described by this config.
    pub fn create_provider(&self) -> Result<Arc<dyn ModelProvider>> {
        self.validate()?;
        let credential = self.credential.clone().unwrap_or_default();

        match self.provider {
            #[cfg(feature = "azure")]
            ProviderKind::Azure => Ok(Arc::new(crate::provider::azure::AzureOpenAiProvider::new(
                self.endpoint.clone().unwrap_or_default(),
                self.model.clone(),
                credential,
                self.api_version.clone().unwrap_or_default(),
            ))),
            #[cfg(feature = "openai")]
            ProviderKind::OpenAi => Ok(Arc::new(crate::provider::openai::OpenAiProvider::new(
                self.model.clone(),
                credential,
                self.endpoint.clone(),
            ))),
            #[allow(unreachable_patterns)]
            other => Err(MathMcpError::Configuration(format!(
                "Provider {other:?} is not enabled in this build"
            ))),
        }
    }
}
