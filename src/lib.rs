//! mathmcp — a minimal Model Context Protocol tool server and a
//! tool-calling chat client.
//!
//! The server ([`server::MathServer`]) exposes `calculate_geometric_mean`
//! over stdio or the network. The client side connects to any number of MCP
//! servers ([`mcp::SessionManager`]), flattens their tools into a
//! chat-completion catalog ([`mcp::ToolCatalog`]) and lets a model call them
//! ([`orchestrator::QueryOrchestrator`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use mathmcp::prelude::*;
//!
//! # async fn example() -> mathmcp::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let mut sessions = SessionManager::new();
//! sessions.connect_sse("http://127.0.0.1:9123/sse").await?;
//! let catalog = sessions.build_catalog().await?;
//!
//! let orchestrator = QueryOrchestrator::new(config.create_provider()?, (&config).into());
//! let outcome = orchestrator
//!     .process_query(&sessions, &catalog, "What is the geometric mean of 4 and 9?")
//!     .await;
//! sessions.close().await;
//! println!("{}", outcome?.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
