//! Request catalog loading
//!
//! Catalogs are plain data: an ordered JSON list of asset requests, either a
//! bare array or wrapped as `{ "assets": [...] }`. Input order is preserved;
//! it drives progress reporting and cost accumulation.

use crate::request::AssetRequest;
use muse_core::{MuseError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { assets: Vec<AssetRequest> },
    Bare(Vec<AssetRequest>),
}

/// Load an ordered request catalog from a JSON file
pub fn load_catalog(path: &Path) -> Result<Vec<AssetRequest>> {
    let content = std::fs::read_to_string(path)?;
    let file: CatalogFile = serde_json::from_str(&content).map_err(|e| {
        MuseError::CatalogError(format!("Failed to parse catalog {}: {}", path.display(), e))
    })?;
    let requests = match file {
        CatalogFile::Wrapped { assets } => assets,
        CatalogFile::Bare(assets) => assets,
    };
    validate(&requests)?;
    Ok(requests)
}

fn validate(requests: &[AssetRequest]) -> Result<()> {
    for (index, request) in requests.iter().enumerate() {
        if request.id.trim().is_empty() {
            return Err(MuseError::CatalogError(format!(
                "Catalog entry {} has an empty id",
                index
            )));
        }
        if request.name.trim().is_empty() {
            return Err(MuseError::CatalogError(format!(
                "Catalog entry {} ('{}') has an empty name",
                index, request.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AssetKind;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_catalog(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("muse_catalog_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const SAMPLE: &str = r#"{
        "assets": [
            {
                "id": "1.0",
                "name": "Hero Banner",
                "kind": "image",
                "prompt": "sunrise over mountains",
                "provider_model": "fal-ai/flux/dev",
                "priority": "high"
            },
            {
                "id": "2.1",
                "name": "door creak",
                "kind": "audio",
                "prompt": "old door creaking",
                "provider_model": "elevenlabs/sound-effects",
                "params": { "duration": 3 }
            }
        ]
    }"#;

    #[test]
    fn test_load_wrapped_catalog_keeps_order() {
        let path = temp_catalog(SAMPLE);
        let requests = load_catalog(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].id, "1.0");
        assert_eq!(requests[1].kind, AssetKind::Audio);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_bare_array() {
        let path = temp_catalog(
            r#"[{ "id": "3.0", "name": "x", "kind": "video",
                  "prompt": "p", "provider_model": "fal-ai/veo2" }]"#,
        );
        let requests = load_catalog(&path).unwrap();
        assert_eq!(requests.len(), 1);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_empty_id_rejected() {
        let path = temp_catalog(
            r#"[{ "id": " ", "name": "x", "kind": "image",
                  "prompt": "p", "provider_model": "m" }]"#,
        );
        let err = load_catalog(&path).unwrap_err();
        assert!(err.to_string().contains("empty id"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let path = temp_catalog(
            r#"[{ "id": "1.0", "name": "x", "kind": "hologram",
                  "prompt": "p", "provider_model": "m" }]"#,
        );
        assert!(load_catalog(&path).is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
