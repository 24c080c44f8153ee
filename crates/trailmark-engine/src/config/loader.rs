use super::schema::TrailmarkConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./trailmark.yaml
    /// 2. ~/.trailmark/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<TrailmarkConfig, ConfigError> {
        for candidate in Self::default_locations() {
            if candidate.exists() {
                return Self::load_from(&candidate).await;
            }
        }
        Ok(TrailmarkConfig::default())
    }

    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./trailmark.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".trailmark").join("config.yaml"));
        }
        paths
    }

    pub async fn load_from(path: &Path) -> Result<TrailmarkConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: TrailmarkConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
