use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "COMPOUND_EXPLORER_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "compound-explorer.json";
pub const IMAGES_ENV: &str = "COMPOUND_EXPLORER_IMAGES";
pub const VIDEOS_ENV: &str = "COMPOUND_EXPLORER_VIDEOS";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_REFERER: &str = "https://abbottabadcompoundmaterial.streamlit.app/";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Top-level settings.  Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Classified image table (CSV or Parquet).
    pub image_table: PathBuf,
    /// Video table (CSV or Parquet).
    pub video_table: PathBuf,
    /// Initial value of the score threshold slider.
    pub default_threshold: f64,
    pub fetch: FetchConfig,
    pub gallery: GalleryConfig,
}

/// HTTP settings for remote assets.  The asset host blocks requests without
/// a browser-like user agent and referer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub referer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub columns: usize,
    pub page_size: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            image_table: PathBuf::from("data/df.csv"),
            video_table: PathBuf::from("data/video_data.csv"),
            default_threshold: 0.8,
            fetch: FetchConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            page_size: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ExplorerConfig {
    /// Resolve settings from the process environment:
    /// `$COMPOUND_EXPLORER_CONFIG`, else `./compound-explorer.json` if it
    /// exists, else defaults; then table path overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Same as [`ExplorerConfig::load`] with an injectable variable lookup.
    pub fn resolve(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = match env(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        let config = config.with_overrides(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Read settings from {}", path.display());
        Ok(config)
    }

    fn with_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = env(IMAGES_ENV) {
            self.image_table = PathBuf::from(path);
        }
        if let Some(path) = env(VIDEOS_ENV) {
            self.video_table = PathBuf::from(path);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.gallery.columns == 0 {
            return Err(ConfigError::Invalid {
                field: "gallery.columns",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.gallery.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "gallery.page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(ConfigError::Invalid {
                field: "default_threshold",
                reason: format!("{} is outside [0, 1]", self.default_threshold),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "fetch": { "timeout_secs": 5 }, "gallery": { "columns": 4 } }"#)
            .unwrap();

        let config = ExplorerConfig::from_file(&path).unwrap();
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.referer, DEFAULT_REFERER);
        assert_eq!(config.gallery.columns, 4);
        assert_eq!(config.gallery.page_size, 30);
        assert_eq!(config.image_table, PathBuf::from("data/df.csv"));
    }

    #[test]
    fn env_selects_file_and_overrides_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "default_threshold": 0.5 }"#).unwrap();
        let path_str = path.display().to_string();

        let config = ExplorerConfig::resolve(env_from(&[
            (CONFIG_ENV, path_str.as_str()),
            (VIDEOS_ENV, "/srv/videos.parquet"),
        ]))
        .unwrap();
        assert_eq!(config.default_threshold, 0.5);
        assert_eq!(config.video_table, PathBuf::from("/srv/videos.parquet"));
        assert_eq!(config.image_table, PathBuf::from("data/df.csv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ExplorerConfig::resolve(env_from(&[(CONFIG_ENV, "/nonexistent/cfg.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ExplorerConfig::from_file(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn validation_rejects_degenerate_settings() {
        let mut config = ExplorerConfig::default();
        assert!(config.validate().is_ok());

        config.fetch.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "fetch.timeout_secs", .. })
        ));

        let mut config = ExplorerConfig::default();
        config.default_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = ExplorerConfig::default();
        config.gallery.page_size = 0;
        assert!(config.validate().is_err());
    }
}
