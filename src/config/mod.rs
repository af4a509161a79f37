pub mod cycle_config;
pub mod link_config;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::cycle_config::CycleConfig;
use crate::config::link_config::LinkConfig;
use crate::utils::ensure_directory_exists;

const CONFIG_DIR_NAME: &str = "nekomimi-link";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub cycle: CycleConfig,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Default location of the config file, under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Loads the config from a configuration file.
    pub async fn load_config(file_path: &Path) -> Result<Self> {
        if !file_path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Saves the current config to a configuration file.
    pub async fn save_config(&self, file_path: &Path) -> Result<()> {
        if let Some(config_dir) = file_path.parent() {
            ensure_directory_exists(config_dir).await?;
        }

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;
        info!("Config saved to {:?}.", file_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nekomimi-link-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let path = scratch_dir("missing").join(CONFIG_FILE_NAME);
        let config = AppConfig::load_config(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = scratch_dir("save");
        let path = dir.join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.link.release_write_lock_on_silence = true;
        config.cycle.step = 5;
        config.log_level = Some("debug".to_string());
        config.save_config(&path).await.unwrap();

        let loaded = AppConfig::load_config(&path).await.unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"link": {"scan_duration_ms": 5000}}"#).unwrap();
        assert_eq!(config.link.scan_duration_ms, 5000);
        assert_eq!(config.link.connect_timeout_ms, 4000);
        assert_eq!(config.link.max_response_packets, 20);
        assert_eq!(config.cycle, CycleConfig::default());
    }
}
