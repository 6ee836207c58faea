//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del batch
//! - Definisce `BackendConfig`: un campo per ogni backend di compressione
//! - Fornisce validazione robusta dei parametri prima dell'avvio del batch
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Backend (default):
//! - `pngquant`: true, `optipng`: false, `zopflipng`: true
//! - `jpeg_recompress`: false, `mozjpeg`: true
//! - `gifsicle`: true
//! - `svgo`: true
//!
//! Ogni backend accetta un booleano oppure un oggetto di parametri:
//! ```json
//! { "backends": { "mozjpeg": { "quality": 75 }, "optipng": true, "svgo": false } }
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::backend::BackendId;
use crate::error::OptimizeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Backend-specific parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolOptions {
    /// Quality (1-100) for lossy backends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Optimization level, meaning depends on the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Extra arguments appended verbatim to the tool command line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

/// A backend is either switched on/off or enabled with parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendSetting {
    Switch(bool),
    Options(ToolOptions),
}

impl BackendSetting {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Switch(enabled) => *enabled,
            Self::Options(_) => true,
        }
    }

    /// Options to run the backend with, `None` when disabled
    pub fn options(&self) -> Option<ToolOptions> {
        match self {
            Self::Switch(true) => Some(ToolOptions::default()),
            Self::Switch(false) => None,
            Self::Options(options) => Some(options.clone()),
        }
    }
}

impl From<bool> for BackendSetting {
    fn from(enabled: bool) -> Self {
        Self::Switch(enabled)
    }
}

/// Enabled backends, one field per supported backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub optipng: BackendSetting,
    pub pngquant: BackendSetting,
    pub zopflipng: BackendSetting,
    pub jpeg_recompress: BackendSetting,
    pub mozjpeg: BackendSetting,
    pub gifsicle: BackendSetting,
    pub svgo: BackendSetting,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            optipng: false.into(),
            pngquant: true.into(),
            zopflipng: true.into(),
            jpeg_recompress: false.into(),
            mozjpeg: true.into(),
            gifsicle: true.into(),
            svgo: true.into(),
        }
    }
}

impl BackendConfig {
    /// Every backend switched off
    pub fn none() -> Self {
        Self {
            optipng: false.into(),
            pngquant: false.into(),
            zopflipng: false.into(),
            jpeg_recompress: false.into(),
            mozjpeg: false.into(),
            gifsicle: false.into(),
            svgo: false.into(),
        }
    }

    pub fn setting(&self, id: BackendId) -> &BackendSetting {
        match id {
            BackendId::Optipng => &self.optipng,
            BackendId::Pngquant => &self.pngquant,
            BackendId::Zopflipng => &self.zopflipng,
            BackendId::JpegRecompress => &self.jpeg_recompress,
            BackendId::Mozjpeg => &self.mozjpeg,
            BackendId::Gifsicle => &self.gifsicle,
            BackendId::Svgo => &self.svgo,
        }
    }

    pub fn setting_mut(&mut self, id: BackendId) -> &mut BackendSetting {
        match id {
            BackendId::Optipng => &mut self.optipng,
            BackendId::Pngquant => &mut self.pngquant,
            BackendId::Zopflipng => &mut self.zopflipng,
            BackendId::JpegRecompress => &mut self.jpeg_recompress,
            BackendId::Mozjpeg => &mut self.mozjpeg,
            BackendId::Gifsicle => &mut self.gifsicle,
            BackendId::Svgo => &mut self.svgo,
        }
    }

    /// Backends currently enabled, in declaration order
    pub fn enabled(&self) -> Vec<BackendId> {
        BackendId::ALL
            .iter()
            .copied()
            .filter(|id| self.setting(*id).is_enabled())
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for id in BackendId::ALL {
            let BackendSetting::Options(options) = self.setting(id) else {
                continue;
            };

            if let Some(quality) = options.quality {
                if quality == 0 || quality > 100 {
                    return Err(OptimizeError::Validation(format!("{} quality must be between 1 and 100", id)).into());
                }
            }

            if let Some(level) = options.level {
                let (min_level, max_level) = (id.min_level(), id.max_level());
                if level < min_level || level > max_level {
                    return Err(OptimizeError::Validation(format!(
                        "{} level must be between {} and {}",
                        id, min_level, max_level
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Enabled backends and their parameters
    pub backends: BackendConfig,
    /// Number of parallel workers
    pub workers: usize,
    /// Files above this size (bytes) are rejected instead of loaded
    pub max_file_size: u64,
    /// Timeout for a single backend invocation, in seconds
    pub transform_timeout_secs: u64,
    /// Dry run - compute savings without writing anything
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backends: BackendConfig::default(),
            workers: default_workers(),
            max_file_size: 256 * 1024 * 1024,
            transform_timeout_secs: 180,
            dry_run: false,
            json_output: false,
        }
    }
}

/// One worker per available core, 4 when the core count is unknown
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(OptimizeError::Validation("Number of workers must be greater than 0".to_string()).into());
        }

        if self.max_file_size == 0 {
            return Err(OptimizeError::Validation("Maximum file size must be greater than 0".to_string()).into());
        }

        if self.transform_timeout_secs == 0 {
            return Err(OptimizeError::Validation("Transform timeout must be greater than 0 seconds".to_string()).into());
        }

        self.backends.validate()
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_secs(self.transform_timeout_secs)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(OptimizeError::Io)?;
        let config: Config = serde_json::from_str(&content).map_err(OptimizeError::Config)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizeError>(),
            Some(OptimizeError::Validation(_))
        ));

        config.workers = 4;
        config.transform_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.transform_timeout_secs = 30;
        config.backends.mozjpeg = BackendSetting::Options(ToolOptions {
            quality: Some(101),
            ..Default::default()
        });
        assert!(config.validate().is_err());

        config.backends.mozjpeg = BackendSetting::Options(ToolOptions {
            quality: Some(75),
            ..Default::default()
        });
        assert!(config.validate().is_ok());

        config.backends.optipng = BackendSetting::Options(ToolOptions {
            level: Some(9),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_below_backend_minimum_is_rejected() {
        let mut config = Config::default();
        config.backends.pngquant = BackendSetting::Options(ToolOptions {
            level: Some(0),
            ..Default::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pngquant level must be between 1 and 11"));

        config.backends.pngquant = BackendSetting::Options(ToolOptions {
            level: Some(1),
            ..Default::default()
        });
        assert!(config.validate().is_ok());

        // optipng accepts -o0
        config.backends.optipng = BackendSetting::Options(ToolOptions {
            level: Some(0),
            ..Default::default()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let typo = serde_json::from_str::<Config>(r#"{ "backends": { "mozjpg": false, "optpng": true } }"#);
        assert!(typo.is_err());

        let top_level = serde_json::from_str::<Config>(r#"{ "worker": 2 }"#);
        assert!(top_level.is_err());

        let option_typo = serde_json::from_str::<BackendConfig>(r#"{ "mozjpeg": { "qualty": 70 } }"#);
        assert!(option_typo.is_err());

        let valid: Config = serde_json::from_str(r#"{ "workers": 2, "backends": { "optipng": true } }"#).unwrap();
        assert_eq!(valid.workers, 2);
        assert!(valid.backends.optipng.is_enabled());
    }

    #[tokio::test]
    async fn test_config_file_with_unknown_backend_fails_to_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "backends": { "optpng": true } }"#).unwrap();

        let err = Config::from_file(&config_path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizeError>(),
            Some(OptimizeError::Config(_))
        ));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.workers >= 1);
        assert_eq!(config.transform_timeout_secs, 180);
        assert!(!config.dry_run);
        assert_eq!(
            config.backends.enabled(),
            vec![
                BackendId::Pngquant,
                BackendId::Zopflipng,
                BackendId::Mozjpeg,
                BackendId::Gifsicle,
                BackendId::Svgo,
            ]
        );
    }

    #[test]
    fn test_backend_setting_accepts_bool_or_object() {
        let backends: BackendConfig = serde_json::from_str(
            r#"{ "optipng": true, "svgo": false, "mozjpeg": { "quality": 70 } }"#,
        )
        .unwrap();

        assert!(backends.optipng.is_enabled());
        assert!(!backends.svgo.is_enabled());
        assert_eq!(backends.mozjpeg.options().unwrap().quality, Some(70));
        // unspecified fields keep their defaults
        assert!(backends.pngquant.is_enabled());
        assert!(!backends.jpeg_recompress.is_enabled());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut original_config = Config {
            workers: 8,
            max_file_size: 1024,
            transform_timeout_secs: 5,
            dry_run: true,
            ..Default::default()
        };
        original_config.backends.optipng = BackendSetting::Options(ToolOptions {
            level: Some(3),
            extra_args: vec!["-quiet".to_string()],
            ..Default::default()
        });

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.workers, 8);
        assert_eq!(loaded_config.max_file_size, 1024);
        assert_eq!(loaded_config.transform_timeout(), Duration::from_secs(5));
        assert!(loaded_config.dry_run);
        assert_eq!(loaded_config.backends, original_config.backends);
    }

    #[tokio::test]
    async fn test_missing_config_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config.backends, BackendConfig::default());
    }
}
