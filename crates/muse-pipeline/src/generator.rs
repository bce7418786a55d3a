//! The generation operation
//!
//! One call per asset request: build kind-specific arguments, submit to the
//! provider, pull the content locator out of the response, normalize image
//! payloads, persist the artifact plus its sidecar, and append a manifest
//! entry. Dry-run and quota-degraded requests skip the provider entirely
//! and come back as cost previews; previews are never catalogued as
//! delivered.

use crate::batch::RunContext;
use crate::config::MuseConfig;
use crate::fault::is_quota_error;
use crate::kinds::adapter_for;
use crate::manifest::GenerationLedger;
use crate::normalize::{normalize_image, NormalizeTarget};
use crate::pricing::PriceTable;
use crate::provider::ProviderClient;
use crate::request::{AssetKind, AssetRequest, GenerationOutcome};
use muse_core::{extract_ordinal, make_name, MuseError, Result};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DRY_RUN_REASON: &str = "dry-run";
const NO_CREDITS_REASON: &str = "no credits available";

/// Extensions trusted when derived from a content locator
const KNOWN_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "mp3", "wav", "ogg", "mp4", "webm", "mov", "glb", "fbx", "obj",
    "usdz", "svg",
];

/// Drives one asset request from arguments to persisted artifact
pub struct Generator {
    client: Box<dyn ProviderClient>,
    pricing: PriceTable,
    output_dir: PathBuf,
    default_image_target: NormalizeTarget,
}

impl Generator {
    pub fn new(client: Box<dyn ProviderClient>, config: &MuseConfig, output_dir: PathBuf) -> Self {
        let default_image_target = NormalizeTarget::parse(&config.generation.image_target)
            .unwrap_or(NormalizeTarget::Archival);
        Self {
            client,
            pricing: PriceTable::new(),
            output_dir,
            default_image_target,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve one request. Never returns an error: every failure is
    /// captured as data in the outcome.
    pub fn generate(
        &self,
        request: &AssetRequest,
        ctx: &RunContext,
        ledger: &mut GenerationLedger,
    ) -> GenerationOutcome {
        let estimated_cost = self.pricing.estimate(&request.provider_model);

        if ctx.dry_run {
            debug!(asset = %request.id, "dry-run requested, skipping provider");
            return GenerationOutcome::preview(request, DRY_RUN_REASON, estimated_cost);
        }
        if ctx.credits_exhausted() {
            debug!(asset = %request.id, "credits exhausted, routing to preview");
            return GenerationOutcome::preview(request, NO_CREDITS_REASON, estimated_cost);
        }

        let adapter = adapter_for(request.kind);
        let arguments = adapter.build_arguments(request);

        let response = match self.client.submit(&request.provider_model, &arguments) {
            Ok(response) => response,
            Err(e) => return self.classify_failure(request, ctx, e.to_string(), estimated_cost),
        };

        // Some providers report failures inside a 2xx response body
        if let Some(message) = response.get("error").and_then(|e| e.as_str()) {
            return self.classify_failure(request, ctx, message.to_string(), estimated_cost);
        }

        let locator = match adapter.extract_locator(&response, request) {
            Some(locator) => locator,
            None => {
                return GenerationOutcome::failure(
                    request,
                    "no content locator in provider response".to_string(),
                    estimated_cost,
                )
            }
        };

        let bytes = match self.client.fetch(&locator) {
            Ok(bytes) => bytes,
            Err(e) => return self.classify_failure(request, ctx, e.to_string(), estimated_cost),
        };

        let (filename, local_path) = match self.persist(request, &locator, &bytes) {
            Ok(persisted) => persisted,
            Err(e) => return GenerationOutcome::failure(request, e.to_string(), estimated_cost),
        };

        ledger.add(
            &filename,
            &request.prompt,
            &request.kind.to_string(),
            &request.id,
            Some(locator.clone()),
            Some(local_path.to_string_lossy().to_string()),
            Some(json!({
                "provider_model": request.provider_model,
                "scene": request.scene,
            })),
        );

        info!(asset = %request.id, file = %filename, "persisted artifact");

        GenerationOutcome {
            asset_id: request.id.clone(),
            name: request.name.clone(),
            success: true,
            content_locator: Some(locator),
            local_path: Some(local_path.to_string_lossy().to_string()),
            error: None,
            quota_error: false,
            dry_run: false,
            estimated_cost,
            prompt: request.prompt.clone(),
        }
    }

    /// Route a provider failure message: quota exhaustion flips the run into
    /// permanent degraded mode, anything else fails this one asset
    fn classify_failure(
        &self,
        request: &AssetRequest,
        ctx: &RunContext,
        message: String,
        estimated_cost: f64,
    ) -> GenerationOutcome {
        if is_quota_error(&message) {
            warn!(asset = %request.id, "quota exhausted: {}", message);
            ctx.set_credits_exhausted();
            let mut outcome = GenerationOutcome::preview(request, NO_CREDITS_REASON, estimated_cost);
            outcome.quota_error = true;
            return outcome;
        }
        warn!(asset = %request.id, "generation failed: {}", message);
        GenerationOutcome::failure(request, message, estimated_cost)
    }

    /// Normalize (images), write the artifact and its sidecar, return the
    /// canonical filename and path
    fn persist(
        &self,
        request: &AssetRequest,
        locator: &str,
        bytes: &[u8],
    ) -> Result<(String, PathBuf)> {
        let (content, ext) = match request.kind {
            AssetKind::Image => {
                let target = request
                    .param_str("format")
                    .and_then(NormalizeTarget::parse)
                    .unwrap_or(self.default_image_target);
                let (normalized, ext) = normalize_image(bytes, target)?;
                (normalized, ext)
            }
            kind => {
                let ext = locator_extension(locator).unwrap_or_else(|| kind.default_extension());
                (bytes.to_vec(), ext)
            }
        };

        let ordinal = extract_ordinal(&request.id);
        let filename = make_name(
            ordinal,
            &request.kind.to_string(),
            &request.name,
            request.version,
            Some(ext),
        );

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(&filename);
        std::fs::write(&path, &content)
            .map_err(|e| MuseError::PersistenceError(format!("{}: {}", path.display(), e)))?;

        let content_hash = format!("sha256:{:x}", Sha256::digest(&content));
        self.write_sidecar(request, locator, &filename, &content_hash)?;

        Ok((filename, path))
    }

    /// Sidecar `{stem}.json` alongside the artifact with the full request
    /// and provenance
    fn write_sidecar(
        &self,
        request: &AssetRequest,
        locator: &str,
        filename: &str,
        content_hash: &str,
    ) -> Result<()> {
        let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);
        let sidecar_path = self.output_dir.join(format!("{}.json", stem));
        let sidecar = json!({
            "request": request,
            "result_locator": locator,
            "filename": filename,
            "content_hash": content_hash,
        });
        let content = serde_json::to_string_pretty(&sidecar).map_err(|e| {
            MuseError::PersistenceError(format!("Failed to serialize sidecar: {}", e))
        })?;
        std::fs::write(&sidecar_path, content)
            .map_err(|e| MuseError::PersistenceError(format!("{}: {}", sidecar_path.display(), e)))?;
        Ok(())
    }
}

/// Derive a trusted extension from a locator path, ignoring query strings
fn locator_extension(locator: &str) -> Option<&'static str> {
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    let ext = path.rsplit('/').next()?.rsplit_once('.')?.1.to_lowercase();
    KNOWN_EXTENSIONS.iter().find(|k| **k == ext).copied()
}
