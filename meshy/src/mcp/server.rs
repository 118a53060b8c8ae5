//! MCP server over stdio.
//!
//! Implements the JSON-RPC 2.0 protocol for MCP communication: one request
//! per line on stdin, one response per line on stdout. Logging goes to
//! stderr so the protocol channel stays clean.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::MeshyError;

/// Type alias for async tool handler functions.
pub type ToolHandler = Box<
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value, MeshyError>> + Send>> + Send + Sync,
>;

/// MCP JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// MCP JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

/// MCP JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool definition advertised through `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP server holding the registered tool set.
pub struct MCPServer {
    name: String,
    version: String,
    tools: HashMap<String, (ToolDefinition, Arc<ToolHandler>)>,
}

impl MCPServer {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            tools: HashMap::new(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Get all tool definitions.
    pub fn get_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.values().map(|(def, _)| def).collect()
    }

    /// Call a tool by name with arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, MeshyError> {
        let (_, handler) = self
            .tools
            .get(name)
            .ok_or_else(|| MeshyError::Tool(format!("Unknown tool: {name}")))?;

        handler(arguments).await
    }

    /// Register a tool with its handler.
    pub fn register_tool(
        &mut self,
        name: &str,
        description: &str,
        input_schema: Value,
        handler: ToolHandler,
    ) {
        let definition = ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        };
        self.tools
            .insert(name.to_string(), (definition, Arc::new(handler)));
    }

    /// Run the MCP server over stdio until the client disconnects.
    pub async fn run_stdio(&self) -> Result<(), MeshyError> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .map_err(|err| MeshyError::Tool(format!("IO error: {err}")))?;

            if bytes_read == 0 {
                // EOF - client disconnected
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<MCPRequest>(trimmed) {
                Ok(request) => {
                    // Notifications carry no id and get no response.
                    let is_notification = request.id.is_none();
                    let response = self.handle_request(request).await;
                    if is_notification {
                        continue;
                    }
                    response
                }
                Err(err) => MCPResponse {
                    jsonrpc: "2.0".to_string(),
                    id: None,
                    result: None,
                    error: Some(MCPError {
                        code: -32700,
                        message: format!("Parse error: {err}"),
                        data: None,
                    }),
                },
            };

            let response_json = serde_json::to_string(&response)?;
            stdout
                .write_all(response_json.as_bytes())
                .await
                .map_err(|err| MeshyError::Tool(format!("IO error: {err}")))?;
            stdout
                .write_all(b"\n")
                .await
                .map_err(|err| MeshyError::Tool(format!("IO error: {err}")))?;
            stdout
                .flush()
                .await
                .map_err(|err| MeshyError::Tool(format!("IO error: {err}")))?;
        }

        Ok(())
    }

    /// Handle a single MCP request.
    pub async fn handle_request(&self, request: MCPRequest) -> MCPResponse {
        debug!(method = %request.method, "MCP request");
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "ping" => Ok(json!({ "pong": true })),
            other => Err(MeshyError::Tool(format!("Method not found: {other}"))),
        };

        match result {
            Ok(result) => MCPResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(result),
                error: None,
            },
            Err(err) => {
                warn!(method = %request.method, %err, "MCP request failed");
                MCPResponse {
                    jsonrpc: "2.0".to_string(),
                    id: request.id,
                    result: None,
                    error: Some(MCPError {
                        code: -32603,
                        message: err.to_string(),
                        data: None,
                    }),
                }
            }
        }
    }

    fn handle_initialize(&self) -> Result<Value, MeshyError> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.name,
                "version": self.version
            }
        }))
    }

    fn handle_tools_list(&self) -> Result<Value, MeshyError> {
        let tools: Vec<&ToolDefinition> = self.tools.values().map(|(def, _)| def).collect();

        Ok(json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, MeshyError> {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MeshyError::Tool("Missing tool name".to_string()))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = self.call_tool(tool_name, arguments).await?;

        Ok(json!({
            "content": [{
                "type": "text",
                "text": serde_json::to_string_pretty(&result).unwrap_or_default()
            }]
        }))
    }
}
