//! Meshy AI task-streaming client and MCP tool surface.
//!
//! Two halves: [`client`] and [`sse`] implement the HTTP + SSE core against
//! the Meshy REST API (plain calls plus following a task's event stream
//! until it reaches a terminal status), and [`mcp`] exposes that core as
//! Model Context Protocol tools over stdio.

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod sse;
pub mod tasks;

pub use client::MeshyClient;
pub use config::MeshyConfig;
pub use error::MeshyError;
