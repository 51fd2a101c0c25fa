use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::camera::CameraKind;

/// Vision endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://pingul-agentesinteligentes.hf.space/upload_info";

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "WELLMINDED_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub camera: Option<String>,
    pub device: Option<String>,
    pub still_image: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Endpoint to post frames to: env var first, then config, then the default.
    pub fn resolved_endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Camera backend to open; unknown names are an error rather than a silent fallback.
    pub fn camera_kind(&self) -> Result<CameraKind> {
        match self.camera.as_deref() {
            None => Ok(CameraKind::default()),
            Some(name) => CameraKind::from_str(name)
                .ok_or_else(|| anyhow!("Unknown camera backend '{}' (expected one of: {})", name, CameraKind::names())),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("wellminded").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: Some("http://localhost:7860/upload_info".to_string()),
            camera: Some("still".to_string()),
            device: None,
            still_image: Some(PathBuf::from("/tmp/face.png")),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "camera": "synthetic" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.camera.as_deref(), Some("synthetic"));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    // The only test in this crate that touches ENDPOINT_ENV
    #[test]
    fn test_endpoint_precedence() {
        std::env::remove_var(ENDPOINT_ENV);
        let mut config = Config::new();
        assert_eq!(config.resolved_endpoint(), DEFAULT_ENDPOINT);

        config.endpoint = Some("http://config.local/upload_info".to_string());
        assert_eq!(config.resolved_endpoint(), "http://config.local/upload_info");

        std::env::set_var(ENDPOINT_ENV, "http://env.local/upload_info");
        assert_eq!(config.resolved_endpoint(), "http://env.local/upload_info");

        std::env::set_var(ENDPOINT_ENV, "  ");
        assert_eq!(config.resolved_endpoint(), "http://config.local/upload_info");

        std::env::remove_var(ENDPOINT_ENV);
    }

    #[test]
    fn test_camera_kind_parsing() {
        let mut config = Config::new();
        assert_eq!(config.camera_kind().unwrap(), CameraKind::default());

        config.camera = Some("Synthetic".to_string());
        assert_eq!(config.camera_kind().unwrap(), CameraKind::Synthetic);

        config.camera = Some("webcam9000".to_string());
        assert!(config.camera_kind().is_err());
    }
}
