//! Mock provider transport for tests and offline runs
//!
//! Serves scripted response maps without any network calls and synthesizes
//! tiny valid PNG bytes on fetch so the full persist path can run.

use crate::provider::ProviderClient;
use muse_core::{MuseError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Script {
    Respond(serde_json::Value),
    Fail(String),
}

/// In-process provider that replays scripted responses in order.
///
/// When the script queue is empty, every submit succeeds with a single
/// image-list response pointing at a mock locator.
pub struct MockClient {
    script: Mutex<VecDeque<Script>>,
    submit_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            submit_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Queue a canned response map for the next submit
    pub fn enqueue_response(&self, response: serde_json::Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Script::Respond(response));
    }

    /// Queue a failure message for the next submit
    pub fn enqueue_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Script::Fail(message.to_string()));
    }

    /// Number of submit calls observed so far
    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Number of fetch calls observed so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl ProviderClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn submit(
        &self,
        _provider_model: &str,
        _parameters: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Script::Respond(value)) => Ok(value),
            Some(Script::Fail(message)) => Err(MuseError::ProviderError(message)),
            None => Ok(serde_json::json!({
                "images": [{ "url": "mock://content/1.png" }]
            })),
        }
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if locator.ends_with(".png") {
            synth_png()
        } else {
            Ok(b"mock-binary-content".to_vec())
        }
    }
}

// Lets tests hand the generator a client while keeping a counting handle
impl ProviderClient for std::sync::Arc<MockClient> {
    fn name(&self) -> &str {
        MockClient::name(self)
    }

    fn submit(
        &self,
        provider_model: &str,
        parameters: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        MockClient::submit(self, provider_model, parameters)
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        MockClient::fetch(self, locator)
    }
}

/// Encode a small solid-color RGBA PNG in memory
fn synth_png() -> Result<Vec<u8>> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([180, 120, 40, 255]));
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| MuseError::ProviderError(format!("Failed to synthesize PNG: {}", e)))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_response_is_image_list() {
        let client = MockClient::new();
        let response = client.submit("fal-ai/flux/dev", &serde_json::json!({})).unwrap();
        assert_eq!(
            response["images"][0]["url"].as_str(),
            Some("mock://content/1.png")
        );
        assert_eq!(client.submit_count(), 1);
    }

    #[test]
    fn test_scripted_failure_then_default() {
        let client = MockClient::new();
        client.enqueue_failure("model not found");

        let err = client
            .submit("fal-ai/flux/dev", &serde_json::json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("model not found"));

        assert!(client.submit("fal-ai/flux/dev", &serde_json::json!({})).is_ok());
        assert_eq!(client.submit_count(), 2);
    }

    #[test]
    fn test_fetch_serves_decodable_png() {
        let client = MockClient::new();
        let bytes = client.fetch("mock://content/1.png").unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 8);
        assert_eq!(client.fetch_count(), 1);
    }

    #[test]
    fn test_fetch_non_image_bytes() {
        let client = MockClient::new();
        let bytes = client.fetch("mock://content/take.glb").unwrap();
        assert!(!bytes.is_empty());
    }
}
