//! Provider transport registry

pub mod http;
pub mod mock;

use crate::config::MuseConfig;
use crate::provider::ProviderClient;
use muse_core::{MuseError, Result};

/// Provider families recognized in config and model-id routing
pub const PROVIDER_FAMILIES: &[&str] = &["fal", "elevenlabs", "meshy"];

/// Create a provider transport by name
pub fn create_client(name: &str, config: &MuseConfig) -> Result<Box<dyn ProviderClient>> {
    match name {
        "mock" => Ok(Box::new(mock::MockClient::new())),
        "http" => Ok(Box::new(http::GatewayClient::from_config(config))),
        _ => Err(MuseError::ProviderError(format!(
            "Unknown provider transport '{}'. Available: mock, http",
            name
        ))),
    }
}
