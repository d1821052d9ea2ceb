//! Model Context Protocol (MCP) client side: sessions, tool listing and the
//! chat-completion tool catalog.

pub mod catalog;
pub mod client;
pub mod schema;
pub mod session;
pub mod transport;

pub use catalog::{transform_tools, ToolCatalog};
pub use client::{MCPClient, MCPToolCallResult};
pub use schema::MCPToolSchema;
pub use session::{MCPClientOps, SessionId, SessionManager};
pub use transport::{MCPTransport, SSETransport, StdioTransport};
