//! Math functions exposed as MCP tools.

pub mod geometric_mean;

pub use geometric_mean::geometric_mean;
