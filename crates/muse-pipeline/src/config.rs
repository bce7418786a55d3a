//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `MUSE_{PROVIDER}_API_KEY`
//! 2. Project-local: `.muse/config.toml`
//! 3. Global: `~/.muse/config.toml`

use muse_core::{MuseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Provider-family configuration (api key, endpoint override)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Resolved pipeline behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Transport-level retries per HTTP call; 0 means a single attempt
    pub max_retries: usize,
    /// Default image normalization target: "archival" or "flattened"
    pub image_target: String,
    /// Manifest filename within the output directory
    pub manifest_filename: String,
    /// Default output directory for a run
    pub output_dir: String,
}

/// Generation knobs as they appear in a config file. Fields stay `Option`
/// until the layers are merged, so an explicit project-level value always
/// wins over the global layer, including explicit defaults like
/// `max_retries = 0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationFileConfig {
    #[serde(default)]
    pub max_retries: Option<usize>,
    #[serde(default)]
    pub image_target: Option<String>,
    #[serde(default)]
    pub manifest_filename: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl GenerationFileConfig {
    fn resolve(self) -> GenerationConfig {
        GenerationConfig {
            max_retries: self.max_retries.unwrap_or(0),
            image_target: self.image_target.unwrap_or_else(default_image_target),
            manifest_filename: self
                .manifest_filename
                .unwrap_or_else(default_manifest_filename),
            output_dir: self.output_dir.unwrap_or_else(default_output_dir),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            image_target: default_image_target(),
            manifest_filename: default_manifest_filename(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_image_target() -> String {
    "archival".to_string()
}
fn default_manifest_filename() -> String {
    "manifest.json".to_string()
}
fn default_output_dir() -> String {
    "generated".to_string()
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuseConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationFileConfig,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct MuseConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub generation: GenerationConfig,
}

impl MuseConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = MuseConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".muse/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config);

        Ok(MuseConfig {
            providers: config.providers,
            generation: config.generation.resolve(),
        })
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(MuseConfig {
            providers: config.providers,
            generation: config.generation.resolve(),
        })
    }

    /// Get API key for a provider family
    pub fn api_key(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_key.as_deref())
    }

    /// Get API URL override for a provider family
    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    /// Check if a provider family is enabled
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.providers
            .get(provider_name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".muse").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<MuseConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: MuseConfigFile = toml::from_str(&content).map_err(|e| {
            MuseError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut MuseConfigFile, overlay: MuseConfigFile) {
        for (name, provider) in overlay.providers {
            let entry = base.providers.entry(name).or_default();
            if provider.api_key.is_some() {
                entry.api_key = provider.api_key;
            }
            if provider.api_url.is_some() {
                entry.api_url = provider.api_url;
            }
            entry.enabled = provider.enabled;
        }

        if overlay.generation.max_retries.is_some() {
            base.generation.max_retries = overlay.generation.max_retries;
        }
        if overlay.generation.image_target.is_some() {
            base.generation.image_target = overlay.generation.image_target;
        }
        if overlay.generation.manifest_filename.is_some() {
            base.generation.manifest_filename = overlay.generation.manifest_filename;
        }
        if overlay.generation.output_dir.is_some() {
            base.generation.output_dir = overlay.generation.output_dir;
        }
    }

    fn apply_env_overrides(config: &mut MuseConfigFile) {
        for name in crate::providers::PROVIDER_FAMILIES {
            let env_key = format!("MUSE_{}_API_KEY", name.to_uppercase());
            if let Ok(key) = std::env::var(&env_key) {
                let entry = config.providers.entry(name.to_string()).or_default();
                entry.api_key = Some(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("muse_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        std::env::remove_var("MUSE_FAL_API_KEY");

        let config_str = r#"
[providers.fal]
api_key = "test-key-123"
api_url = "https://api.example.com/fal"
enabled = true

[providers.meshy]
api_key = "msy_test"
enabled = false

[generation]
max_retries = 2
image_target = "flattened"
"#;
        let path = temp_config(config_str);
        let config = MuseConfig::load_from_file(&path).unwrap();

        assert!(config.is_enabled("fal"));
        assert!(!config.is_enabled("meshy"));
        assert_eq!(config.api_url("fal"), Some("https://api.example.com/fal"));
        assert_eq!(config.generation.max_retries, 2);
        assert_eq!(config.generation.image_target, "flattened");
        assert_eq!(config.generation.manifest_filename, "manifest.json");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_var_override() {
        let config_str = r#"
[providers.elevenlabs]
api_key = "file-key"
"#;
        let path = temp_config(config_str);

        std::env::set_var("MUSE_ELEVENLABS_API_KEY", "env-key-override");

        let config = MuseConfig::load_from_file(&path).unwrap();
        assert_eq!(config.api_key("elevenlabs"), Some("env-key-override"));

        std::env::remove_var("MUSE_ELEVENLABS_API_KEY");
        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_project_layer_resets_generation_knobs() {
        let global: MuseConfigFile = toml::from_str(
            r#"
[generation]
max_retries = 3
image_target = "flattened"
"#,
        )
        .unwrap();
        let project: MuseConfigFile = toml::from_str(
            r#"
[generation]
max_retries = 0
image_target = "archival"
"#,
        )
        .unwrap();

        let mut merged = MuseConfigFile::default();
        MuseConfig::merge_into(&mut merged, global);
        MuseConfig::merge_into(&mut merged, project);

        // An explicit project value wins even when it matches a default
        let resolved = merged.generation.resolve();
        assert_eq!(resolved.max_retries, 0);
        assert_eq!(resolved.image_target, "archival");
    }

    #[test]
    fn test_silent_project_layer_keeps_global_knobs() {
        let global: MuseConfigFile = toml::from_str(
            r#"
[generation]
max_retries = 3
"#,
        )
        .unwrap();
        let project: MuseConfigFile = toml::from_str(
            r#"
[providers.fal]
api_key = "k"
"#,
        )
        .unwrap();

        let mut merged = MuseConfigFile::default();
        MuseConfig::merge_into(&mut merged, global);
        MuseConfig::merge_into(&mut merged, project);

        assert_eq!(merged.generation.resolve().max_retries, 3);
    }

    #[test]
    fn test_defaults() {
        let config = MuseConfig::default();
        assert_eq!(config.generation.max_retries, 0);
        assert_eq!(config.generation.image_target, "archival");
        assert!(config.is_enabled("anything")); // defaults to true
        assert_eq!(config.api_key("nonexistent"), None);
    }
}
