//! Meshy task families, their REST endpoints and request bodies.

use serde::{Deserialize, Serialize};

/// Account balance endpoint.
pub const BALANCE_PATH: &str = "v1/balance";

/// The asynchronous job families exposed by the Meshy API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    TextTo3d,
    ImageTo3d,
    Remesh,
    TextToTexture,
}

impl TaskKind {
    /// Collection path used for create and list calls.
    ///
    /// Text-to-3d lives under the v2 API; the other families are still v1.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::TextTo3d => "v2/text-to-3d",
            Self::ImageTo3d => "v1/image-to-3d",
            Self::Remesh => "v1/remesh",
            Self::TextToTexture => "v1/text-to-texture",
        }
    }

    pub fn task_path(self, task_id: &str) -> String {
        format!("{}/{}", self.collection_path(), task_id)
    }

    pub fn stream_path(self, task_id: &str) -> String {
        format!("{}/{}/stream", self.collection_path(), task_id)
    }
}

/// Request body for a text-to-3d task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTo3dRequest {
    /// Task mode: "preview" or "refine".
    pub mode: String,
    pub prompt: String,
    #[serde(default = "default_art_style")]
    pub art_style: String,
    #[serde(default = "default_true")]
    pub should_remesh: bool,
}

/// Request body for an image-to-3d task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTo3dRequest {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default = "default_art_style")]
    pub art_style: String,
}

/// Request body for a remesh task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemeshRequest {
    pub input_task_id: String,
    #[serde(default = "default_target_formats")]
    pub target_formats: Vec<String>,
    /// "quad" or "triangle".
    #[serde(default = "default_topology")]
    pub topology: String,
    #[serde(default = "default_target_polycount")]
    pub target_polycount: u64,
    #[serde(default = "default_resize_height")]
    pub resize_height: f64,
    /// "bottom", "center", etc.
    #[serde(default = "default_origin_at")]
    pub origin_at: String,
}

/// Request body for a text-to-texture task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToTextureRequest {
    pub model_url: String,
    pub object_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
    #[serde(default = "default_true")]
    pub enable_original_uv: bool,
    #[serde(default = "default_true")]
    pub enable_pbr: bool,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_art_style")]
    pub art_style: String,
}

/// Pagination parameters for list calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListTasksParams {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_page")]
    pub page: u64,
}

impl Default for ListTasksParams {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page: default_page(),
        }
    }
}

impl ListTasksParams {
    /// Query pairs in insertion order, string-coerced.
    pub fn to_query(self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("page_size", Some(self.page_size.to_string())),
            ("page", Some(self.page.to_string())),
        ]
    }
}

fn default_true() -> bool {
    true
}

fn default_art_style() -> String {
    "realistic".to_string()
}

fn default_target_formats() -> Vec<String> {
    vec!["glb".to_string(), "fbx".to_string()]
}

fn default_topology() -> String {
    "quad".to_string()
}

fn default_target_polycount() -> u64 {
    50_000
}

fn default_resize_height() -> f64 {
    1.0
}

fn default_origin_at() -> String {
    "bottom".to_string()
}

fn default_resolution() -> String {
    "1024".to_string()
}

fn default_page_size() -> u64 {
    10
}

fn default_page() -> u64 {
    1
}
