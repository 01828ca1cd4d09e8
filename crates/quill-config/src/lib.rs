use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quill_core::UiLanguage;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Caps and quality applied when a cover image is attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePolicy {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_width: 1280,
            max_height: 1280,
            jpeg_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub schema_version: u32,
    pub language: UiLanguage,
    #[serde(default)]
    pub image: ImagePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            language: UiLanguage::ViVn,
            image: ImagePolicy::default(),
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("config.json"),
        }
    }

    pub fn from_default_location() -> Result<Self> {
        let mut dir = dirs::config_dir().context("failed to resolve config_dir")?;
        dir.push("quill");
        Ok(Self::from_dir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).context("failed to parse app config json")?;
        self.migrate(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn migrate(&self, config: &mut AppConfig) {
        if config.image.jpeg_quality == 0 || config.image.jpeg_quality > 100 {
            warn!(
                quality = config.image.jpeg_quality,
                "invalid jpeg quality in config, resetting image policy"
            );
            config.image = ImagePolicy::default();
        }

        if config.schema_version >= CURRENT_SCHEMA_VERSION {
            return;
        }

        warn!(
            from = config.schema_version,
            to = CURRENT_SCHEMA_VERSION,
            "migrating app config schema"
        );
        config.schema_version = CURRENT_SCHEMA_VERSION;
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::from_dir(dir.path());
        let config = store.load_or_init().expect("load default");
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.language, UiLanguage::ViVn);
        assert_eq!(config.image, ImagePolicy::default());
        assert!(store.path().exists());
    }

    #[test]
    fn persists_changes_across_reloads() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::from_dir(dir.path());
        let mut config = store.load_or_init().expect("init");
        config.language = UiLanguage::EnUs;
        store.save(&config).expect("save");

        let reloaded = store.load_or_init().expect("reload");
        assert_eq!(reloaded.language, UiLanguage::EnUs);
    }

    #[test]
    fn migrate_resets_nonsense_image_policy() {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::from_dir(dir.path());
        let mut config = store.load_or_init().expect("init");
        config.image.jpeg_quality = 0;
        store.save(&config).expect("save");

        let reloaded = store.load_or_init().expect("reload");
        assert_eq!(reloaded.image, ImagePolicy::default());
    }
}
