//! User configuration
//!
//! Stored in `~/.config/helmpack/config.yaml`. Every key is optional and a
//! missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};

/// Release name used when rendering charts
pub const DEFAULT_RELEASE_NAME: &str = "test-release";

/// Registry project charts and images are imported into
pub const DEFAULT_PROJECT: &str = "library";

/// helmpack configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Chart tool executable
    pub helm_binary: String,

    /// Container runtime executable
    pub docker_binary: String,

    /// Release name passed to `helm template`
    pub release_name: String,

    /// Default target project for imports
    pub default_project: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            helm_binary: "helm".to_string(),
            docker_binary: "docker".to_string(),
            release_name: DEFAULT_RELEASE_NAME.to_string(),
            default_project: DEFAULT_PROJECT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| ClientError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ClientError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("helmpack").join("config.yaml"))
    }
}
