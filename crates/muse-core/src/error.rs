//! Error types for Muse

use thiserror::Error;

/// The main error type for Muse operations
#[derive(Debug, Error)]
pub enum MuseError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Normalization error: {0}")]
    NormalizationError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Muse operations
pub type Result<T> = std::result::Result<T, MuseError>;
