//! Convenience re-exports for common use.

pub use crate::config::{ClientConfig, ServerConfig, ToolDispatch};
pub use crate::error::{MathMcpError, Result};
pub use crate::mcp::{MCPToolSchema, SessionId, SessionManager, ToolCatalog};
pub use crate::orchestrator::{OrchestratorConfig, QueryOrchestrator, QueryOutcome};
pub use crate::provider::{ModelProvider, ToolDefinition};
pub use crate::server::{MathServer, TransportKind};
pub use crate::types::{AgentToolCall, ModelMessage, Role};
