//! Error types for the Meshy client and tool layer.

use thiserror::Error;

/// Errors surfaced by the Meshy HTTP client and the MCP tool handlers.
#[derive(Debug, Error)]
pub enum MeshyError {
    /// Non-2xx HTTP response, carrying the best-effort body text.
    #[error("request to {url} failed with status {status}: {body}")]
    RequestFailed {
        status: u16,
        url: String,
        body: String,
    },

    /// The stream deadline elapsed before a terminal status was observed.
    #[error("stream timed out after {0} ms")]
    StreamTimeout(u64),

    /// Transport failure while draining a stream body.
    #[error("error reading stream body: {0}")]
    StreamBody(#[source] reqwest::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Tool layer failures: unknown tool, missing or malformed parameters.
    #[error("{0}")]
    Tool(String),
}
