//! MCP tool server exposing the math tools.

pub mod transport;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::MathMcpError;
use crate::tools::geometric_mean;

pub use transport::{serve, TransportKind};

/// Name under which the geometric mean is registered.
pub const GEOMETRIC_MEAN_TOOL: &str = "calculate_geometric_mean";

const INSTRUCTIONS: &str = "Mathematical tools server. Call calculate_geometric_mean with a \
list of positive numbers to get their geometric mean.";

/// Arguments of `calculate_geometric_mean`.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GeometricMeanRequest {
    /// Positive numbers to average.
    pub values: Vec<f64>,
}

/// Tool registry served over any MCP transport.
#[derive(Clone)]
pub struct MathServer {
    name: String,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MathServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool_router: Self::tool_router(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[tool(description = "Calculate the geometric mean of a list of positive numbers")]
    async fn calculate_geometric_mean(
        &self,
        Parameters(GeometricMeanRequest { values }): Parameters<GeometricMeanRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!(count = values.len(), "calculate_geometric_mean");
        match geometric_mean(&values) {
            Ok(mean) => Ok(CallToolResult::success(vec![Content::text(render_mean(mean))])),
            Err(MathMcpError::InvalidInput(message)) => {
                Ok(CallToolResult::error(vec![Content::text(message)]))
            }
            Err(other) => Ok(CallToolResult::error(vec![Content::text(other.to_string())])),
        }
    }
}

/// JSON number rendering, so whole means keep their fraction (`6.0`).
/// Non-finite means have no JSON form and fall back to `inf`.
fn render_mean(mean: f64) -> String {
    if mean.is_finite() {
        serde_json::to_string(&mean).unwrap_or_else(|_| mean.to_string())
    } else {
        mean.to_string()
    }
}

#[tool_handler]
impl ServerHandler for MathServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.name.clone();

        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            ..Default::default()
        }
    }
}
