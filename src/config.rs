//! Configuration management for Gaze GW
//!
//! Handles loading and parsing of the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub pupil: PupilConfig,
}

/// Staged capture device (Tobii-style) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Device address offered as the default endpoint
    #[serde(default = "default_capture_endpoint")]
    pub endpoint: String,
}

/// Pupil Capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PupilConfig {
    /// Remote-plugin address of the Pupil Capture instance
    #[serde(default = "default_pupil_endpoint")]
    pub endpoint: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: default_capture_endpoint(),
        }
    }
}

impl Default for PupilConfig {
    fn default() -> Self {
        Self {
            endpoint: default_pupil_endpoint(),
        }
    }
}

fn default_capture_endpoint() -> String {
    "192.168.1.100".to_string()
}

fn default_pupil_endpoint() -> String {
    "tcp://127.0.0.1:50020".to_string()
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_known_devices() {
        let config = AppConfig::default();
        assert_eq!(config.capture.endpoint, "192.168.1.100");
        assert_eq!(config.pupil.endpoint, "tcp://127.0.0.1:50020");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: AppConfig = serde_yaml::from_str("capture:\n  endpoint: 10.0.0.5\n").unwrap();
        assert_eq!(config.capture.endpoint, "10.0.0.5");
        assert_eq!(config.pupil.endpoint, "tcp://127.0.0.1:50020");
    }

    #[tokio::test]
    async fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gaze.yaml");

        let config = AppConfig::load_or_default(&missing).await.unwrap();
        assert_eq!(config.capture.endpoint, "192.168.1.100");
    }

    #[tokio::test]
    async fn test_load_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaze.yaml");
        std::fs::write(&path, "pupil:\n  endpoint: tcp://10.1.1.1:50020\n").unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.pupil.endpoint, "tcp://10.1.1.1:50020");
        assert_eq!(config.capture.endpoint, "192.168.1.100");
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaze.yaml");
        std::fs::write(&path, "capture: [not a map\n").unwrap();

        assert!(AppConfig::load(&path).await.is_err());
    }
}
