//! Provider transport seam
//!
//! The core assumes nothing about a provider beyond "submit parameters,
//! eventually receive a response map, or fail with a human-readable message".

use muse_core::Result;

/// Opaque generation-provider capability
pub trait ProviderClient: Send {
    /// Transport name (e.g. "http", "mock")
    fn name(&self) -> &str;

    /// Submit generation parameters to a provider model and return its
    /// response map
    fn submit(&self, provider_model: &str, parameters: &serde_json::Value)
        -> Result<serde_json::Value>;

    /// Download the content behind a locator returned by `submit`
    fn fetch(&self, locator: &str) -> Result<Vec<u8>>;
}
