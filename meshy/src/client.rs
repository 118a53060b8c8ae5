//! Meshy HTTP client: plain task calls and SSE task streaming.
//!
//! One outbound network call per invocation, no retries; retry policy is a
//! caller concern. Each call owns its own deadline, line buffer and
//! snapshot, so concurrent invocations need no coordination.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::config::MeshyConfig;
use crate::error::MeshyError;
use crate::sse::{self, LineBuffer};

/// Cooperative deadline shared by every await within one call.
///
/// A budget of 0 installs no deadline; the operation is bounded only by
/// transport-level defaults.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    fn after_ms(budget_ms: u64) -> Self {
        Self {
            at: (budget_ms > 0).then(|| Instant::now() + Duration::from_millis(budget_ms)),
        }
    }

    /// Resolves when the deadline passes; pends forever when none is set.
    async fn expired(self) {
        match self.at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}

/// Client for the Meshy OpenAPI, cheap to clone and share.
#[derive(Debug, Clone)]
pub struct MeshyClient {
    config: Arc<MeshyConfig>,
    http: reqwest::Client,
}

impl MeshyClient {
    pub fn new(config: MeshyConfig) -> Result<Self, MeshyError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &MeshyConfig {
        &self.config
    }

    /// Build the absolute endpoint URL for `path`.
    ///
    /// Exactly one slash separates base and path regardless of whether the
    /// path carries a leading one. Query pairs are appended in order;
    /// `None` values are omitted entirely rather than serialized.
    pub fn endpoint(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<Url, MeshyError> {
        let absolute = format!(
            "{}/{}",
            self.config.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&absolute)?;

        let present: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
            .collect();
        if !present.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in present {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Perform one authenticated GET and decode the JSON body.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
        timeout_ms: Option<u64>,
    ) -> Result<Value, MeshyError> {
        let url = self.endpoint(path, query)?;
        debug!(%url, "GET");

        let mut request = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json");
        if let Some(timeout) = request_timeout(timeout_ms) {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        Self::decode_json(url, response).await
    }

    /// Perform one authenticated POST with a JSON body.
    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
        body: &Value,
        timeout_ms: Option<u64>,
    ) -> Result<Value, MeshyError> {
        let url = self.endpoint(path, query)?;
        debug!(%url, "POST");

        let mut request = self
            .http
            .post(url.clone())
            .header(AUTHORIZATION, self.bearer())
            .json(body);
        if let Some(timeout) = request_timeout(timeout_ms) {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        Self::decode_json(url, response).await
    }

    /// Follow a task's SSE stream until it reaches a terminal status, the
    /// deadline passes, or the server closes the body.
    ///
    /// Returns the most recently observed task snapshot: the terminal one
    /// when a terminal status arrives (the connection is released
    /// immediately, without waiting for a natural close), the last seen
    /// snapshot on a clean close, or a placeholder when the stream carried
    /// no frames at all. A `timeout_ms` of `None` uses the configured
    /// default; 0 disables the deadline.
    pub async fn stream_task(
        &self,
        path: &str,
        timeout_ms: Option<u64>,
    ) -> Result<Value, MeshyError> {
        let url = self.endpoint(path, &[])?;
        let budget_ms = timeout_ms.unwrap_or_else(|| self.config.stream_timeout_ms());
        let deadline = Deadline::after_ms(budget_ms);
        debug!(%url, budget_ms, "opening task stream");

        let request = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, "text/event-stream");

        let response = tokio::select! {
            result = request.send() => result?,
            () = deadline.expired() => return Err(MeshyError::StreamTimeout(budget_ms)),
        };

        let status = response.status();
        if !status.is_success() {
            // The error body must not outlive the deadline either; a server
            // that stalls after failure headers would otherwise hang us.
            return Err(tokio::select! {
                err = Self::request_failed(url.clone(), status, response) => err,
                () = deadline.expired() => MeshyError::RequestFailed {
                    status: status.as_u16(),
                    url: url.to_string(),
                    body: "<body not read before stream deadline>".to_string(),
                },
            });
        }

        let mut body = response.bytes_stream();
        let mut buffer = LineBuffer::new();
        let mut snapshot: Option<Value> = None;

        loop {
            let chunk = tokio::select! {
                chunk = body.next() => chunk,
                () = deadline.expired() => return Err(MeshyError::StreamTimeout(budget_ms)),
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(MeshyError::StreamBody)?;

            for line in buffer.push(&chunk) {
                if let Some(terminal) = apply_frame(&line, &mut snapshot) {
                    debug!(%url, "terminal status observed, releasing stream");
                    return Ok(terminal);
                }
            }
        }

        // Clean close: the server may end the body on an unterminated line.
        if let Some(line) = buffer.finish() {
            if let Some(terminal) = apply_frame(&line, &mut snapshot) {
                return Ok(terminal);
            }
        }

        debug!(%url, "stream closed without terminal status");
        Ok(snapshot.unwrap_or_else(no_data_snapshot))
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_key())
    }

    async fn decode_json(url: Url, response: reqwest::Response) -> Result<Value, MeshyError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::request_failed(url, status, response).await);
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fold a non-success response into the structured failure, keeping
    /// the original HTTP error even when the body cannot be read.
    async fn request_failed(url: Url, status: StatusCode, response: reqwest::Response) -> MeshyError {
        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("<failed to read body: {err}>"));
        MeshyError::RequestFailed {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        }
    }
}

/// Process one complete line against the current snapshot.
///
/// Returns the snapshot when it is terminal, ending the stream. A frame
/// that fails to parse replaces the snapshot with a synthetic description
/// of the failure and never aborts the stream.
fn apply_frame(line: &str, snapshot: &mut Option<Value>) -> Option<Value> {
    let payload = sse::data_payload(line)?;
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            if sse::is_terminal(&value) {
                return Some(value);
            }
            *snapshot = Some(value);
        }
        Err(err) => {
            *snapshot = Some(json!({
                "error": "failed to parse stream frame",
                "raw": payload,
                "detail": err.to_string(),
            }));
        }
    }
    None
}

fn no_data_snapshot() -> Value {
    json!({ "error": "No data received from stream" })
}

fn request_timeout(timeout_ms: Option<u64>) -> Option<Duration> {
    timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
}
