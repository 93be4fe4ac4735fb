//! File configuration.
//!
//! ```toml
//! [stabilization]
//! enabled = true
//!
//! [tracker]
//! retry_count = 2
//! pos_steadiness = 30
//!
//! [tracker.property]
//! threshold = 300
//! frame_count = 10
//!
//! [device]
//! face_threshold = 500
//! face_size = { min = 64, max = 8192 }
//!
//! [album]
//! path = "HVCAlbum.alb"
//! ```
//!
//! Every section and field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::album::DEFAULT_ALBUM_FILE;
use crate::error::{Error, Result};
use crate::integration::DeviceSettings;
use crate::tracker::TrackerConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stabilization: StabilizationConfig,
    pub tracker: TrackerConfig,
    pub device: DeviceSettings,
    pub album: AlbumConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    /// Run the tracker and merge its output
    pub enabled: bool,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumConfig {
    pub path: PathBuf,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ALBUM_FILE),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.device.validate()?;
        if self.album.path.as_os_str().is_empty() {
            return Err(Error::Config("album path must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::StabilizeFlags;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.stabilization.enabled);
        assert_eq!(config.tracker.retry_count, 2);
        assert_eq!(config.tracker.property.frame_count, 10);
        assert_eq!(config.tracker.recognition.frame_count, 5);
        assert_eq!(config.tracker.recognition.min_ratio, 60);
        assert_eq!(config.device.face_size.min, 64);
        assert_eq!(config.album.path, PathBuf::from("HVCAlbum.alb"));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [stabilization]
            enabled = false

            [tracker]
            functions = 0x05
            pos_steadiness = 10

            [tracker.recognition]
            frame_count = 3
            min_ratio = 50

            [device]
            body_size = { min = 40, max = 4096 }
            "#,
        )
        .unwrap();

        assert!(!config.stabilization.enabled);
        assert_eq!(config.tracker.functions, StabilizeFlags::BODY | StabilizeFlags::FACE);
        assert_eq!(config.tracker.pos_steadiness, 10);
        assert_eq!(config.tracker.size_steadiness, 30);
        assert_eq!(config.tracker.recognition.frame_count, 3);
        assert_eq!(config.tracker.recognition.threshold, 300);
        assert_eq!(config.tracker.recognition.min_ratio, 50);
        assert_eq!(config.device.body_size.max, 4096);
        assert_eq!(config.device.face_threshold, 500);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            Config::from_toml("[tracker.property]\nframe_count = 0"),
            Err(Error::Config(_))
        ));
        assert!(Config::from_toml("[tracker]\nsize_steadiness = 101").is_err());
        assert!(Config::from_toml("[tracker.recognition]\nmin_ratio = 120").is_err());
        assert!(Config::from_toml("[tracker]\nretry_count = \"two\"").is_err());
    }
}
