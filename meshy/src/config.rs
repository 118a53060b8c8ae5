//! Configuration for the Meshy API adapter.
//!
//! Built once at process start and shared read-only by every request; the
//! client never mutates it afterward.

use url::Url;

use crate::error::MeshyError;

/// Default Meshy OpenAPI base address.
pub const DEFAULT_API_BASE: &str = "https://api.meshy.ai/openapi";

/// Default budget for following a task stream, in milliseconds.
pub const DEFAULT_STREAM_TIMEOUT_MS: u64 = 300_000;

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct MeshyConfig {
    api_key: String,
    base_url: String,
    stream_timeout_ms: u64,
}

impl MeshyConfig {
    /// Create a configuration, validating the base URL up front so a
    /// malformed base fails at startup rather than on first request.
    ///
    /// The base is stored without a trailing slash; a stream timeout of 0
    /// disables the automatic deadline.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        stream_timeout_ms: u64,
    ) -> Result<Self, MeshyError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MeshyError::Config("API key must not be empty".to_string()));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        Ok(Self {
            api_key,
            base_url,
            stream_timeout_ms,
        })
    }

    /// Load configuration from `MESHY_API_KEY` (required), `MESHY_API_BASE`
    /// and `MESHY_STREAM_TIMEOUT_MS` (optional).
    pub fn from_env() -> Result<Self, MeshyError> {
        let api_key = std::env::var("MESHY_API_KEY").map_err(|_| {
            MeshyError::Config("MESHY_API_KEY environment variable is not set".to_string())
        })?;
        let base_url =
            std::env::var("MESHY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let stream_timeout_ms = std::env::var("MESHY_STREAM_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_STREAM_TIMEOUT_MS);

        Self::new(api_key, base_url, stream_timeout_ms)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_timeout_ms(&self) -> u64 {
        self.stream_timeout_ms
    }
}
