//! Batch orchestration
//!
//! Drives the generator over an ordered request list, tallies outcomes by
//! priority tag, and persists the run summary alongside the manifest flush.
//! No failure ever escapes the orchestrator: even a 100%-failure run still
//! produces a summary and a manifest file.

use crate::generator::Generator;
use crate::manifest::GenerationLedger;
use crate::request::{AssetRequest, GenerationOutcome};
use muse_core::{MuseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

const SUMMARY_FILENAME: &str = "generation_summary.json";
const UNCLASSIFIED_PRIORITY: &str = "unclassified";

/// Run-scoped shared state passed by reference into every generation call.
///
/// `credits_exhausted` is the single piece of deliberately shared
/// cross-request state; it is an atomic so concurrent workers would observe
/// the flip before their next request, and it is never global, so concurrent
/// runs in one process cannot interfere.
#[derive(Debug)]
pub struct RunContext {
    /// Preview mode requested up front: no provider calls at all
    pub dry_run: bool,
    credits_exhausted: AtomicBool,
}

impl RunContext {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            credits_exhausted: AtomicBool::new(false),
        }
    }

    pub fn credits_exhausted(&self) -> bool {
        self.credits_exhausted.load(Ordering::SeqCst)
    }

    /// Permanent for the rest of the run; repeated calls against an
    /// exhausted quota have a deterministic, wasteful outcome
    pub fn set_credits_exhausted(&self) {
        self.credits_exhausted.store(true, Ordering::SeqCst);
    }
}

/// Per-priority outcome counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityTally {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Derived once per batch, never mutated after
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub estimated_cost: f64,
    pub by_priority: BTreeMap<String, PriorityTally>,
    pub results: Vec<GenerationOutcome>,
}

/// Sequential batch driver; one ledger and output directory per run
pub struct BatchRunner {
    generator: Generator,
    manifest_filename: String,
}

impl BatchRunner {
    pub fn new(generator: Generator, manifest_filename: &str) -> Self {
        Self {
            generator,
            manifest_filename: manifest_filename.to_string(),
        }
    }

    /// Resolve every request in order and flush summary + manifest.
    ///
    /// Individual failures are folded into the summary; the only errors that
    /// propagate are the final flush writes themselves.
    pub fn run(&self, requests: &[AssetRequest], ctx: &RunContext) -> Result<RunSummary> {
        let mut ledger = GenerationLedger::new();
        let mut results = Vec::with_capacity(requests.len());
        let mut by_priority: BTreeMap<String, PriorityTally> = BTreeMap::new();
        let mut successful = 0;
        let mut estimated_cost = 0.0;

        for (index, request) in requests.iter().enumerate() {
            info!(
                asset = %request.id,
                kind = %request.kind,
                "generating {}/{}: {}",
                index + 1,
                requests.len(),
                request.name
            );

            let outcome = self.generator.generate(request, ctx, &mut ledger);

            let priority = request
                .priority
                .as_deref()
                .unwrap_or(UNCLASSIFIED_PRIORITY);
            let tally = by_priority.entry(priority.to_string()).or_default();
            tally.total += 1;
            if outcome.success {
                tally.successful += 1;
                successful += 1;
            } else {
                tally.failed += 1;
            }
            estimated_cost += outcome.estimated_cost;

            results.push(outcome);
        }

        let summary = RunSummary {
            total: requests.len(),
            successful,
            failed: requests.len() - successful,
            estimated_cost,
            by_priority,
            results,
        };

        self.write_summary(&summary)?;
        let manifest_path = self.generator.output_dir().join(&self.manifest_filename);
        ledger.flush(&manifest_path)?;

        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "run complete"
        );

        Ok(summary)
    }

    fn summary_path(&self) -> PathBuf {
        self.generator.output_dir().join(SUMMARY_FILENAME)
    }

    fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        std::fs::create_dir_all(self.generator.output_dir())?;
        let content = serde_json::to_string_pretty(summary).map_err(|e| {
            MuseError::PersistenceError(format!("Failed to serialize run summary: {}", e))
        })?;
        std::fs::write(self.summary_path(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuseConfig;
    use crate::manifest::ManifestFile;
    use crate::providers::mock::MockClient;
    use crate::request::AssetKind;
    use std::path::Path;
    use std::sync::Arc;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("muse_batch_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn requests(n: usize) -> Vec<AssetRequest> {
        (1..=n)
            .map(|i| AssetRequest {
                id: format!("{}.0", i),
                name: format!("asset {}", i),
                kind: AssetKind::Image,
                prompt: format!("prompt {}", i),
                negative_prompt: None,
                provider_model: "fal-ai/flux/dev".to_string(),
                scene: None,
                priority: Some(if i % 2 == 0 { "high" } else { "low" }.to_string()),
                version: None,
                params: serde_json::Map::new(),
            })
            .collect()
    }

    fn runner(mock: Arc<MockClient>, dir: &Path) -> BatchRunner {
        let generator = Generator::new(Box::new(mock), &MuseConfig::default(), dir.to_path_buf());
        BatchRunner::new(generator, "manifest.json")
    }

    fn read_manifest(dir: &Path) -> ManifestFile {
        let content = std::fs::read_to_string(dir.join("manifest.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_scenario_all_succeed() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());
        for _ in 0..3 {
            mock.enqueue_response(serde_json::json!({
                "images": [{ "url": "mock://x/1.png" }]
            }));
        }

        let summary = runner(mock.clone(), &dir)
            .run(&requests(3), &RunContext::new(false))
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.results.len(), 3);

        let manifest = read_manifest(&dir);
        assert_eq!(manifest.total_assets, 3);

        // Three artifacts on disk
        assert!(dir.join("001_image_asset_1.png").exists());
        assert!(dir.join("002_image_asset_2.png").exists());
        assert!(dir.join("003_image_asset_3.png").exists());
        assert!(dir.join("generation_summary.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scenario_quota_on_first_request() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());
        mock.enqueue_failure("Insufficient balance, top up your balance to continue");

        let ctx = RunContext::new(false);
        let summary = runner(mock.clone(), &dir).run(&requests(3), &ctx).unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.failed, 3);
        for outcome in &summary.results {
            assert!(outcome.dry_run);
            assert!(!outcome.success);
        }
        // Only the first request reached the provider
        assert_eq!(mock.submit_count(), 1);
        assert_eq!(read_manifest(&dir).total_assets, 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dry_run_never_contacts_provider() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());

        let summary = runner(mock.clone(), &dir)
            .run(&requests(4), &RunContext::new(true))
            .unwrap();

        assert_eq!(summary.failed, 4);
        assert!(summary.results.iter().all(|o| o.dry_run));
        assert_eq!(mock.submit_count(), 0);
        assert_eq!(read_manifest(&dir).total_assets, 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_summary_and_manifest_written_on_total_failure() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());
        for _ in 0..3 {
            mock.enqueue_failure("model not found");
        }

        let summary = runner(mock, &dir).run(&requests(3), &RunContext::new(false)).unwrap();

        assert_eq!(summary.failed, 3);
        assert!(dir.join("generation_summary.json").exists());
        assert_eq!(read_manifest(&dir).total_assets, 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_priority_tallies_and_cost() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());

        let summary = runner(mock, &dir).run(&requests(4), &RunContext::new(false)).unwrap();

        let high = &summary.by_priority["high"];
        let low = &summary.by_priority["low"];
        assert_eq!(high.total, 2);
        assert_eq!(low.total, 2);
        assert_eq!(high.successful + low.successful, summary.successful);
        // 4 calls against fal-ai/flux/dev at 0.025 each
        assert!((summary.estimated_cost - 0.1).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mid_batch_quota_preserves_earlier_work() {
        let dir = temp_dir();
        let mock = Arc::new(MockClient::new());
        mock.enqueue_response(serde_json::json!({ "images": [{ "url": "mock://x/1.png" }] }));
        mock.enqueue_failure("You have exhausted balance");

        let summary = runner(mock.clone(), &dir)
            .run(&requests(4), &RunContext::new(false))
            .unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 3);
        assert!(summary.results[0].success);
        assert!(summary.results[1].dry_run);
        assert!(summary.results[2].dry_run);
        assert!(summary.results[3].dry_run);
        assert_eq!(mock.submit_count(), 2);

        // The first artifact is still catalogued and on disk
        assert_eq!(read_manifest(&dir).total_assets, 1);
        assert!(dir.join("001_image_asset_1.png").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
