//! Meshy tool registration: one MCP tool per REST operation.
//!
//! This layer is deliberately thin. Every handler builds a path, forwards
//! the arguments to the client verbatim and returns the JSON value the API
//! produced, unchanged.

use std::sync::Arc;

use serde_json::{json, Value};

use super::server::MCPServer;
use crate::client::MeshyClient;
use crate::error::MeshyError;
use crate::tasks::{
    ImageTo3dRequest, ListTasksParams, RemeshRequest, TaskKind, TextTo3dRequest,
    TextToTextureRequest, BALANCE_PATH,
};

/// Task families with the snake_case slug used in tool names.
const FAMILIES: [(TaskKind, &str, &str); 4] = [
    (TaskKind::TextTo3d, "text_to_3d", "Text to 3D"),
    (TaskKind::ImageTo3d, "image_to_3d", "Image to 3D"),
    (TaskKind::Remesh, "remesh", "Remesh"),
    (TaskKind::TextToTexture, "text_to_texture", "Text to Texture"),
];

/// Register every Meshy tool on the server.
pub fn register_meshy_tools(server: &mut MCPServer, client: Arc<MeshyClient>) {
    register_create_tools(server, &client);

    for (kind, slug, label) in FAMILIES {
        register_retrieve_tool(server, client.clone(), kind, slug, label);
        register_list_tool(server, client.clone(), kind, slug, label);
        register_stream_tool(server, client.clone(), kind, slug, label);
    }

    let balance_client = client;
    server.register_tool(
        "get_balance",
        "Get the current balance of your Meshy AI account",
        json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        Box::new(move |_params| {
            let client = balance_client.clone();
            Box::pin(async move { client.get(BALANCE_PATH, &[], None).await })
        }),
    );
}

fn register_create_tools(server: &mut MCPServer, client: &Arc<MeshyClient>) {
    let c = client.clone();
    server.register_tool(
        "create_text_to_3d_task",
        "Create a new Text to 3D task: generate a 3D model from a text prompt",
        json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "description": "Task mode: 'preview' or 'refine'" },
                "prompt": { "type": "string", "description": "Text prompt describing the 3D model to generate" },
                "art_style": { "type": "string", "default": "realistic", "description": "Art style for the 3D model" },
                "should_remesh": { "type": "boolean", "default": true, "description": "Whether to remesh the model after generation" }
            },
            "required": ["mode", "prompt"]
        }),
        Box::new(move |params| {
            let client = c.clone();
            Box::pin(async move {
                let request: TextTo3dRequest = parse_arguments(params)?;
                let body = serde_json::to_value(&request)?;
                client
                    .post(TaskKind::TextTo3d.collection_path(), &[], &body, None)
                    .await
            })
        }),
    );

    let c = client.clone();
    server.register_tool(
        "create_image_to_3d_task",
        "Create a new Image to 3D task: generate a 3D model from an image",
        json!({
            "type": "object",
            "properties": {
                "image_url": { "type": "string", "description": "URL of the image to convert to 3D" },
                "prompt": { "type": "string", "description": "Optional text prompt to guide the 3D generation" },
                "art_style": { "type": "string", "default": "realistic", "description": "Art style for the 3D model" }
            },
            "required": ["image_url"]
        }),
        Box::new(move |params| {
            let client = c.clone();
            Box::pin(async move {
                let request: ImageTo3dRequest = parse_arguments(params)?;
                let body = serde_json::to_value(&request)?;
                client
                    .post(TaskKind::ImageTo3d.collection_path(), &[], &body, None)
                    .await
            })
        }),
    );

    let c = client.clone();
    server.register_tool(
        "create_remesh_task",
        "Create a new Remesh task: remesh an existing 3D model",
        json!({
            "type": "object",
            "properties": {
                "input_task_id": { "type": "string", "description": "ID of the input task to remesh" },
                "target_formats": {
                    "type": "array",
                    "items": { "type": "string" },
                    "default": ["glb", "fbx"],
                    "description": "Target formats for the remeshed model"
                },
                "topology": { "type": "string", "default": "quad", "description": "Topology type: 'quad' or 'triangle'" },
                "target_polycount": { "type": "integer", "default": 50000, "description": "Target polygon count" },
                "resize_height": { "type": "number", "default": 1.0, "description": "Resize height for the remeshed model" },
                "origin_at": { "type": "string", "default": "bottom", "description": "Origin position: 'bottom', 'center', etc." }
            },
            "required": ["input_task_id"]
        }),
        Box::new(move |params| {
            let client = c.clone();
            Box::pin(async move {
                let request: RemeshRequest = parse_arguments(params)?;
                let body = serde_json::to_value(&request)?;
                client
                    .post(TaskKind::Remesh.collection_path(), &[], &body, None)
                    .await
            })
        }),
    );

    let c = client.clone();
    server.register_tool(
        "create_text_to_texture_task",
        "Create a new Text to Texture task: texture a 3D model from text prompts",
        json!({
            "type": "object",
            "properties": {
                "model_url": { "type": "string", "description": "URL of the 3D model to texture" },
                "object_prompt": { "type": "string", "description": "Text prompt describing the object" },
                "style_prompt": { "type": "string", "description": "Text prompt describing the style" },
                "enable_original_uv": { "type": "boolean", "default": true, "description": "Whether to use original UV mapping" },
                "enable_pbr": { "type": "boolean", "default": true, "description": "Whether to enable PBR textures" },
                "resolution": { "type": "string", "default": "1024", "description": "Texture resolution" },
                "negative_prompt": { "type": "string", "description": "Negative prompt to guide generation" },
                "art_style": { "type": "string", "default": "realistic", "description": "Art style for the texture" }
            },
            "required": ["model_url", "object_prompt"]
        }),
        Box::new(move |params| {
            let client = c.clone();
            Box::pin(async move {
                let request: TextToTextureRequest = parse_arguments(params)?;
                let body = serde_json::to_value(&request)?;
                client
                    .post(TaskKind::TextToTexture.collection_path(), &[], &body, None)
                    .await
            })
        }),
    );
}

fn register_retrieve_tool(
    server: &mut MCPServer,
    client: Arc<MeshyClient>,
    kind: TaskKind,
    slug: &str,
    label: &str,
) {
    server.register_tool(
        &format!("retrieve_{slug}_task"),
        &format!("Retrieve a {label} task by its ID to check status and results"),
        task_id_schema(),
        Box::new(move |params| {
            let client = client.clone();
            Box::pin(async move {
                let task_id = required_str(&params, "task_id")?;
                client.get(&kind.task_path(task_id), &[], None).await
            })
        }),
    );
}

fn register_list_tool(
    server: &mut MCPServer,
    client: Arc<MeshyClient>,
    kind: TaskKind,
    slug: &str,
    label: &str,
) {
    server.register_tool(
        &format!("list_{slug}_tasks"),
        &format!("List your {label} tasks"),
        json!({
            "type": "object",
            "properties": {
                "page_size": { "type": "integer", "default": 10, "description": "Number of tasks to return per page" },
                "page": { "type": "integer", "default": 1, "description": "Page number to return" }
            },
            "required": []
        }),
        Box::new(move |params| {
            let client = client.clone();
            Box::pin(async move {
                let list: ListTasksParams = parse_arguments(params)?;
                client
                    .get(kind.collection_path(), &list.to_query(), None)
                    .await
            })
        }),
    );
}

fn register_stream_tool(
    server: &mut MCPServer,
    client: Arc<MeshyClient>,
    kind: TaskKind,
    slug: &str,
    label: &str,
) {
    server.register_tool(
        &format!("stream_{slug}_task"),
        &format!("Stream updates for a {label} task until it completes or fails"),
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "Task ID" },
                "timeout_ms": { "type": "integer", "description": "Stream timeout in milliseconds (default from configuration)" }
            },
            "required": ["task_id"]
        }),
        Box::new(move |params| {
            let client = client.clone();
            Box::pin(async move {
                let task_id = required_str(&params, "task_id")?;
                let timeout_ms = params.get("timeout_ms").and_then(Value::as_u64);
                client
                    .stream_task(&kind.stream_path(task_id), timeout_ms)
                    .await
            })
        }),
    );
}

fn task_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "task_id": { "type": "string", "description": "Task ID" }
        },
        "required": ["task_id"]
    })
}

/// Deserialize tool arguments, treating a missing params object as empty.
fn parse_arguments<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, MeshyError> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|err| MeshyError::Tool(format!("Invalid tool arguments: {err}")))
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, MeshyError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| MeshyError::Tool(format!("Missing required parameter: {key}")))
}
