//! Per-kind argument building and response interpretation
//!
//! Each asset kind maps generic request fields plus its own optional
//! parameters into the provider's payload shape, and knows how to pull a
//! content locator out of the provider's response. Kinds are a closed set
//! selected by the kind tag on the request.

use crate::request::{AssetKind, AssetRequest};
use serde_json::{json, Value};

/// Two-method contract implemented once per asset kind
pub trait KindAdapter: Sync {
    /// Map the request into the provider's parameter shape
    fn build_arguments(&self, request: &AssetRequest) -> Value;

    /// Pull the content locator out of the provider's response map
    fn extract_locator(&self, response: &Value, _request: &AssetRequest) -> Option<String> {
        default_locator(response)
    }
}

/// Select the adapter for a kind tag
pub fn adapter_for(kind: AssetKind) -> &'static dyn KindAdapter {
    match kind {
        AssetKind::Image => &ImageAdapter,
        AssetKind::Audio => &AudioAdapter,
        AssetKind::Video => &VideoAdapter,
        AssetKind::Model => &ModelAdapter,
        AssetKind::Vector => &VectorAdapter,
    }
}

/// Shared locator extraction: image-list shape, then a flat `url`, then the
/// nested `video.url` / `audio_file.url` shapes
fn default_locator(response: &Value) -> Option<String> {
    response
        .get("images")
        .and_then(|imgs| imgs.as_array())
        .and_then(|arr| arr.first())
        .and_then(|img| img.get("url"))
        .or_else(|| response.get("url"))
        .or_else(|| response.get("video").and_then(|v| v.get("url")))
        .or_else(|| response.get("audio_file").and_then(|a| a.get("url")))
        .and_then(|u| u.as_str())
        .map(|s| s.to_string())
}

struct ImageAdapter;

impl KindAdapter for ImageAdapter {
    fn build_arguments(&self, request: &AssetRequest) -> Value {
        let width = request.param_u64("width").unwrap_or(1024);
        let height = request.param_u64("height").unwrap_or(1024);

        let mut payload = json!({
            "prompt": request.prompt,
            "num_images": 1,
            "enable_safety_checker": false
        });

        // fal-hosted diffusion models take a nested image_size map; other
        // image models take flat dimensions
        if request.provider_model.starts_with("fal-ai/") {
            payload["image_size"] = json!({ "width": width, "height": height });
        } else {
            payload["width"] = json!(width);
            payload["height"] = json!(height);
        }

        if let Some(seed) = request.param_u64("seed") {
            payload["seed"] = json!(seed);
        }
        if let Some(steps) = request.param_u64("steps") {
            payload["num_inference_steps"] = json!(steps);
        }
        if let Some(neg) = &request.negative_prompt {
            payload["negative_prompt"] = json!(neg);
        }
        payload
    }
}

struct AudioAdapter;

impl KindAdapter for AudioAdapter {
    fn build_arguments(&self, request: &AssetRequest) -> Value {
        let duration = request.param_u64("duration").unwrap_or(10);

        // Sound-effect endpoints take text/duration_seconds; the
        // stable-audio family renames both
        let mut payload = if request.provider_model.contains("stable-audio") {
            json!({ "prompt": request.prompt, "seconds_total": duration })
        } else {
            json!({ "text": request.prompt, "duration_seconds": duration })
        };

        if let Some(seed) = request.param_u64("seed") {
            payload["seed"] = json!(seed);
        }
        payload
    }
}

struct VideoAdapter;

impl KindAdapter for VideoAdapter {
    fn build_arguments(&self, request: &AssetRequest) -> Value {
        let mut payload = json!({
            "prompt": request.prompt,
            "duration": request.param_u64("duration").unwrap_or(5)
        });
        if let Some(ratio) = request.param_str("aspect_ratio") {
            payload["aspect_ratio"] = json!(ratio);
        }
        if let Some(neg) = &request.negative_prompt {
            payload["negative_prompt"] = json!(neg);
        }
        if let Some(seed) = request.param_u64("seed") {
            payload["seed"] = json!(seed);
        }
        payload
    }
}

struct ModelAdapter;

impl KindAdapter for ModelAdapter {
    fn build_arguments(&self, request: &AssetRequest) -> Value {
        let mut payload = json!({
            "mode": request.param_str("mode").unwrap_or("preview"),
            "prompt": request.prompt,
            "should_remesh": true
        });
        if let Some(style) = request.param_str("art_style") {
            payload["art_style"] = json!(style);
        }
        if let Some(neg) = &request.negative_prompt {
            payload["negative_prompt"] = json!(neg);
        }
        if let Some(seed) = request.param_u64("seed") {
            payload["seed"] = json!(seed);
        }
        payload
    }

    /// Mesh endpoints return one URL per export format; prefer glb when
    /// several are present
    fn extract_locator(&self, response: &Value, _request: &AssetRequest) -> Option<String> {
        if let Some(urls) = response.get("model_urls") {
            for format in ["glb", "fbx", "obj", "usdz"] {
                if let Some(url) = urls.get(format).and_then(|u| u.as_str()) {
                    return Some(url.to_string());
                }
            }
        }
        default_locator(response)
    }
}

struct VectorAdapter;

impl KindAdapter for VectorAdapter {
    fn build_arguments(&self, request: &AssetRequest) -> Value {
        json!({
            "prompt": request.prompt,
            "style": request.param_str("style").unwrap_or("vector_illustration"),
            "output_format": "svg"
        })
    }
}
