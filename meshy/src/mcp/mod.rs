//! Model Context Protocol surface.
//!
//! - `server`: JSON-RPC 2.0 over stdio with a registered tool set
//! - `tools`: one MCP tool per Meshy REST operation

pub mod server;
pub mod tools;

pub use server::{MCPServer, ToolDefinition, ToolHandler};
