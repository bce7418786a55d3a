//! HTTP gateway transport
//!
//! One generic blocking client covers every hosted provider family: the
//! model id routes to a family (key, endpoint, auth header style) and the
//! parameter map is posted as-is. Provider error bodies are preserved
//! verbatim in the error message so the fault classifier can inspect them.

use crate::config::MuseConfig;
use crate::provider::ProviderClient;
use muse_core::{MuseError, Result};
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 300;
const RETRY_BASE_DELAY_MS: u64 = 500;

const FAL_BASE_URL: &str = "https://queue.fal.run";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/sound-generation";
const MESHY_URL: &str = "https://api.meshy.ai/openapi/v2/text-to-3d";

/// Generic HTTP client for hosted generation providers
pub struct GatewayClient {
    api_keys: HashMap<String, String>,
    url_overrides: HashMap<String, String>,
    max_retries: usize,
}

impl GatewayClient {
    /// Build a client from resolved configuration
    pub fn from_config(config: &MuseConfig) -> Self {
        let mut api_keys = HashMap::new();
        let mut url_overrides = HashMap::new();
        for family in super::PROVIDER_FAMILIES {
            if let Some(key) = config.api_key(family) {
                api_keys.insert(family.to_string(), key.to_string());
            }
            if let Some(url) = config.api_url(family) {
                url_overrides.insert(family.to_string(), url.to_string());
            }
        }
        Self {
            api_keys,
            url_overrides,
            max_retries: config.generation.max_retries,
        }
    }

    fn submit_url(&self, family: &str, provider_model: &str) -> String {
        if let Some(base) = self.url_overrides.get(family) {
            return match family {
                "fal" => format!("{}/{}", base.trim_end_matches('/'), provider_model),
                _ => base.clone(),
            };
        }
        match family {
            "fal" => format!("{}/{}", FAL_BASE_URL, provider_model),
            "elevenlabs" => ELEVENLABS_URL.to_string(),
            _ => MESHY_URL.to_string(),
        }
    }

    fn post_json(
        &self,
        family: &str,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut attempt = 0;
        loop {
            let agent = build_agent();
            let (header, value) = auth_header(family, api_key);
            let response = agent
                .post(url)
                .header(header, &value)
                .header("Content-Type", "application/json")
                .send_json(payload);

            match response {
                Ok(mut resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.body_mut().read_json().map_err(|e| {
                            MuseError::ProviderError(format!(
                                "Failed to parse provider response: {}",
                                e
                            ))
                        });
                    }
                    let body = resp.body_mut().read_to_string().unwrap_or_default();
                    if attempt < self.max_retries && is_retryable_status(status.as_u16()) {
                        sleep_backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(MuseError::ProviderError(format!(
                        "provider returned {}: {}",
                        status.as_u16(),
                        body.trim()
                    )));
                }
                Err(e) => {
                    if attempt < self.max_retries && is_retryable_error(&e) {
                        sleep_backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(MuseError::ProviderError(format!(
                        "provider request failed: {}",
                        e
                    )));
                }
            }
        }
    }
}

impl ProviderClient for GatewayClient {
    fn name(&self) -> &str {
        "http"
    }

    fn submit(
        &self,
        provider_model: &str,
        parameters: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let family = family_for_model(provider_model)?;
        let api_key = self.api_keys.get(family).ok_or_else(|| {
            MuseError::ProviderError(format!(
                "API key not configured for '{}'. Set MUSE_{}_API_KEY or add to .muse/config.toml",
                family,
                family.to_uppercase()
            ))
        })?;
        let url = self.submit_url(family, provider_model);
        self.post_json(family, &url, api_key, parameters)
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        // Result locators are pre-signed URLs; no auth header needed
        let mut attempt = 0;
        loop {
            let agent = build_agent();
            match agent.get(locator).call() {
                Ok(resp) => {
                    let mut reader = resp.into_body().into_reader();
                    let mut bytes = Vec::new();
                    std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(|e| {
                        MuseError::ProviderError(format!("Failed to read content: {}", e))
                    })?;
                    return Ok(bytes);
                }
                Err(e) => {
                    if attempt < self.max_retries && is_retryable_error(&e) {
                        sleep_backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(MuseError::ProviderError(format!(
                        "Failed to download {}: {}",
                        locator, e
                    )));
                }
            }
        }
    }
}

/// Route a provider model id to its provider family
pub fn family_for_model(provider_model: &str) -> Result<&'static str> {
    let head = provider_model.split('/').next().unwrap_or("");
    match head {
        "fal-ai" | "fal" => Ok("fal"),
        "elevenlabs" => Ok("elevenlabs"),
        "meshy" => Ok("meshy"),
        _ => Err(MuseError::ProviderError(format!(
            "No provider family for model '{}'",
            provider_model
        ))),
    }
}

fn auth_header(family: &str, api_key: &str) -> (&'static str, String) {
    match family {
        "fal" => ("Authorization", format!("Key {}", api_key)),
        "elevenlabs" => ("xi-api-key", api_key.to_string()),
        _ => ("Authorization", format!("Bearer {}", api_key)),
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .http_status_as_error(false)
        .build();
    config.into()
}

fn is_retryable_status(code: u16) -> bool {
    matches!(code, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    matches!(
        e,
        ureq::Error::Timeout(_)
            | ureq::Error::Io(_)
            | ureq::Error::ConnectionFailed
            | ureq::Error::HostNotFound
    )
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}
