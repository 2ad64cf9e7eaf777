// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the user's config directory. A missing file means
//! defaults; unknown or missing keys fall back to their defaults too.

use crate::constants;
use crate::errors::ConfigError;
use crate::pipelines::photo::encoding::{EncodingFormat, EncodingQuality};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grace period before a hidden camera view stops the session (ms)
    pub grace_period_ms: u64,
    /// Capture completion timeout (ms)
    pub capture_timeout_ms: u64,
    /// Encoding requested from the hardware
    pub photo_format: EncodingFormat,
    /// JPEG quality preset
    pub photo_quality: EncodingQuality,
    /// Where saved photos go (None = pictures dir)
    pub photos_dir: Option<PathBuf>,
    /// Id of the device bound on the last successful configure
    pub last_camera_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace_period_ms: constants::DEFAULT_GRACE_PERIOD_MS,
            capture_timeout_ms: constants::DEFAULT_CAPTURE_TIMEOUT_MS,
            photo_format: EncodingFormat::Jpeg,
            photo_quality: EncodingQuality::High,
            photos_dir: None,
            last_camera_id: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::APP_DIR).join(constants::CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                debug!(path = %path.display(), "Loading configuration");
                Ok(serde_json::from_str(&contents)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Write to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Directory photos are saved into
    pub fn photos_dir(&self) -> PathBuf {
        self.photos_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(constants::PHOTOS_SUBDIR)
        })
    }
}
