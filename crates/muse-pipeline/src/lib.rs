//! Muse Pipeline - batch generation of versioned media artifacts
//!
//! Drives declarative asset requests through hosted generation providers:
//! per-kind argument building and response parsing, quota-aware degradation
//! into cost preview, output normalization for downstream editors, and an
//! append-only manifest of everything persisted.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod fault;
pub mod generator;
pub mod kinds;
pub mod manifest;
pub mod normalize;
pub mod pricing;
pub mod provider;
pub mod providers;
pub mod request;

pub use batch::{BatchRunner, RunContext, RunSummary};
pub use config::MuseConfig;
pub use fault::is_quota_error;
pub use generator::Generator;
pub use manifest::{GenerationLedger, ManifestEntry};
pub use pricing::PriceTable;
pub use provider::ProviderClient;
pub use request::{AssetKind, AssetRequest, GenerationOutcome};
