//! Append-only generation ledger
//!
//! Records every artifact persisted during one run. The ledger is a trace,
//! not a unique index: repeated adds with the same filename append two
//! entries. Everything accumulates in memory; `flush` is the only operation
//! that touches the filesystem and happens once at run completion.

use muse_core::{now_iso8601, MuseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One record per successfully persisted artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub prompt: String,
    pub timestamp: String,
    pub asset_type: String,
    pub asset_id: String,
    #[serde(default)]
    pub content_locator: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// JSON snapshot shape written by `flush`
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestFile {
    pub generation_started_at: String,
    pub completed_at: String,
    pub total_assets: usize,
    pub assets: Vec<ManifestEntry>,
}

/// In-memory ledger scoped to one run/output directory
#[derive(Debug, Clone)]
pub struct GenerationLedger {
    started_at: String,
    entries: Vec<ManifestEntry>,
}

impl Default for GenerationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationLedger {
    pub fn new() -> Self {
        Self {
            started_at: now_iso8601(),
            entries: Vec::new(),
        }
    }

    /// Append one timestamped entry
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        filename: &str,
        prompt: &str,
        asset_type: &str,
        asset_id: &str,
        content_locator: Option<String>,
        local_path: Option<String>,
        metadata: Option<serde_json::Value>,
    ) {
        self.entries.push(ManifestEntry {
            filename: filename.to_string(),
            prompt: prompt.to_string(),
            timestamp: now_iso8601(),
            asset_type: asset_type.to_string(),
            asset_id: asset_id.to_string(),
            content_locator,
            local_path,
            metadata,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Serialize the ledger snapshot as JSON and return the written path
    pub fn flush(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = ManifestFile {
            generation_started_at: self.started_at.clone(),
            completed_at: now_iso8601(),
            total_assets: self.entries.len(),
            assets: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|e| {
            MuseError::ManifestError(format!("Failed to serialize manifest: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(path.to_path_buf())
    }
}
