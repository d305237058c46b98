//! JSON Configuration Management
//!
//! Handles reading and writing the pipeline configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{PipelineSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_parent_dir};

/// Configuration service for managing pipeline settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: PipelineSettings,
}

impl ConfigService {
    /// Load the default config file (~/.rag-pipeline/config.json), creating it if missing
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load config from `path`, writing defaults there if the file doesn't exist
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        ensure_parent_dir(&config_path)?;

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = PipelineSettings::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!(path = %config_path.display(), "wrote default configuration");
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<PipelineSettings> {
        let content = fs::read_to_string(path)?;
        let config: PipelineSettings = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &PipelineSettings) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &PipelineSettings {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> PipelineSettings {
        self.config.clone()
    }

    /// Update the configuration with a partial update and persist it.
    ///
    /// An update that fails validation leaves both memory and disk unchanged.
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<PipelineSettings> {
        let mut updated = self.config.clone();
        updated.apply_update(update);
        Self::save_to_file(&self.config_path, &updated)?;
        self.config = updated;
        Ok(self.config.clone())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = PipelineSettings::default();
        self.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::DEFAULT_SEED_TEXT;

    #[test]
    fn test_open_creates_default_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let service = ConfigService::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(service.get_config().seed_text, DEFAULT_SEED_TEXT);
        assert_eq!(service.path(), path.as_path());
    }

    #[test]
    fn test_load_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "seed_text": "Berlin is in Germany." }"#).unwrap();

        let service = ConfigService::open(&path).unwrap();
        assert_eq!(service.get_config().seed_text, "Berlin is in Germany.");
        assert_eq!(service.get_config().retrieval.top_k, 2);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "retrieval": { "top_k": 0 } }"#).unwrap();
        assert!(matches!(
            ConfigService::open(&path),
            Err(AppError::Validation(_))
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ConfigService::open(&path),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_config_update_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut service = ConfigService::open(&path).unwrap();

        let updated = service
            .update_config(SettingsUpdate {
                seed_text: Some("Tokyo is the capital of Japan.".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.seed_text, "Tokyo is the capital of Japan.");

        let reopened = ConfigService::open(&path).unwrap();
        assert_eq!(reopened.get_config().seed_text, "Tokyo is the capital of Japan.");
    }

    #[test]
    fn test_rejected_update_leaves_config_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut service = ConfigService::open(temp_dir.path().join("config.json")).unwrap();

        let result = service.update_config(SettingsUpdate {
            top_k: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(service.get_config().retrieval.top_k, 2);
        service.reload().unwrap();
        assert_eq!(service.get_config().retrieval.top_k, 2);
    }

    #[test]
    fn test_reset() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut service = ConfigService::open(temp_dir.path().join("config.json")).unwrap();
        service
            .update_config(SettingsUpdate {
                test_query: Some("Where is Rome?".to_string()),
                ..Default::default()
            })
            .unwrap();
        service.reset().unwrap();
        service.reload().unwrap();
        assert_eq!(service.get_config_clone().test_query, "What is AI?");
    }
}
