//! Generation request and outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of asset to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
    Video,
    Model,
    Vector,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Audio => write!(f, "audio"),
            AssetKind::Video => write!(f, "video"),
            AssetKind::Model => write!(f, "model"),
            AssetKind::Vector => write!(f, "vector"),
        }
    }
}

impl AssetKind {
    /// Default file extension when the content locator carries none
    pub fn default_extension(&self) -> &'static str {
        match self {
            AssetKind::Image => "png",
            AssetKind::Audio => "mp3",
            AssetKind::Video => "mp4",
            AssetKind::Model => "glb",
            AssetKind::Vector => "svg",
        }
    }
}

/// A declarative request to generate one asset.
///
/// Requests are built from catalogs before a run starts and never mutated;
/// the compound `id` ("ordinal.sub") drives filename ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRequest {
    /// Compound id, e.g. "4.2"; the leading integer is the sort ordinal
    pub id: String,
    /// Human-readable name, normalized into the filename
    pub name: String,
    /// Kind of asset to generate
    pub kind: AssetKind,
    /// Generation prompt
    pub prompt: String,
    /// Negative prompt (things to avoid), where the model supports one
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// Provider model id, e.g. "fal-ai/flux/dev"
    pub provider_model: String,
    /// Scene or section this asset belongs to
    #[serde(default)]
    pub scene: Option<String>,
    /// Priority tag used for run-summary tallies
    #[serde(default)]
    pub priority: Option<String>,
    /// Version suffix for the canonical filename
    #[serde(default)]
    pub version: Option<u32>,
    /// Open map of kind-specific generation parameters
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl AssetRequest {
    /// Fetch a numeric parameter from the open map
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(|v| v.as_u64())
    }

    /// Fetch a string parameter from the open map
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

/// The write-once result of one generation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub asset_id: String,
    pub name: String,
    pub success: bool,
    #[serde(default)]
    pub content_locator: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// True when the failure was classified as quota/credit exhaustion
    #[serde(default)]
    pub quota_error: bool,
    /// True when the provider was never contacted (preview or degraded mode)
    #[serde(default)]
    pub dry_run: bool,
    pub estimated_cost: f64,
    pub prompt: String,
}

impl GenerationOutcome {
    /// Synthetic outcome for a request that skipped the provider entirely
    pub fn preview(request: &AssetRequest, reason: &str, estimated_cost: f64) -> Self {
        Self {
            asset_id: request.id.clone(),
            name: request.name.clone(),
            success: false,
            content_locator: None,
            local_path: None,
            error: Some(reason.to_string()),
            quota_error: false,
            dry_run: true,
            estimated_cost,
            prompt: request.prompt.clone(),
        }
    }

    /// Outcome for a single-asset failure; the batch continues
    pub fn failure(request: &AssetRequest, message: String, estimated_cost: f64) -> Self {
        Self {
            asset_id: request.id.clone(),
            name: request.name.clone(),
            success: false,
            content_locator: None,
            local_path: None,
            error: Some(message),
            quota_error: false,
            dry_run: false,
            estimated_cost,
            prompt: request.prompt.clone(),
        }
    }
}
