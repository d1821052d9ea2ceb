//! MCP schema types.

use serde::{Deserialize, Serialize};

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

impl From<rmcp::model::Tool> for MCPToolSchema {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_rmcp_tool_copies_fields() {
        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), json!("object"));
        let tool = rmcp::model::Tool::new("calculate_geometric_mean", "geometric mean", schema);

        let mapped = MCPToolSchema::from(tool);
        assert_eq!(mapped.name, "calculate_geometric_mean");
        assert_eq!(mapped.description.as_deref(), Some("geometric mean"));
        assert_eq!(mapped.input_schema["type"], "object");
    }
}
