//! Flattening MCP tool listings into a chat-completion tool catalog.

use std::collections::HashMap;

use crate::error::{MathMcpError, Result};
use crate::provider::ToolDefinition;

use super::schema::MCPToolSchema;
use super::session::SessionId;

/// Map MCP tool descriptors to chat-completion function definitions,
/// preserving order. The input schema is passed through unchanged.
pub fn transform_tools(tools: &[MCPToolSchema]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|tool| ToolDefinition {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: tool.input_schema.clone(),
        })
        .collect()
}

/// Tool definitions offered to the model plus the tool-to-session route map.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
    routes: HashMap<String, SessionId>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every tool of one session. A name already routed (or repeated
    /// within `tools`) is rejected and the catalog is left unchanged.
    pub fn add_session_tools(&mut self, session: SessionId, tools: &[MCPToolSchema]) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(tools.len());
        for tool in tools {
            if let Some(owner) = self.routes.get(&tool.name) {
                return Err(MathMcpError::InvalidState(format!(
                    "Tool '{}' from {session} is already provided by {owner}",
                    tool.name
                )));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(MathMcpError::InvalidState(format!(
                    "Tool '{}' is listed twice by {session}",
                    tool.name
                )));
            }
        }

        for definition in transform_tools(tools) {
            self.routes.insert(definition.name.clone(), session);
            self.definitions.push(definition);
        }
        Ok(())
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Session that owns `tool_name`.
    pub fn route(&self, tool_name: &str) -> Option<SessionId> {
        self.routes.get(tool_name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
