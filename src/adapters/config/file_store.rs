use crate::{
    domain::User,
    ports::{AppConfig, ConfigError, ConfigResult, ConfigStore},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_DIR: &str = "projecthub";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    data_file: Option<PathBuf>,
    current_user: Option<User>,
}

pub struct FileConfigStore {
    config_path: PathBuf,
    data_dir: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;
        let data_dir = dirs::data_dir().unwrap_or_else(|| config_dir.clone());

        Ok(Self::with_dirs(config_dir.join(APP_DIR), data_dir.join(APP_DIR)))
    }

    /// Store rooted at explicit directories instead of the platform ones.
    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_dir.into().join("config.json"),
            data_dir: data_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn log_path(&self) -> PathBuf {
        self.config_dir().join("projecthub.log")
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(self.config_dir())
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // First run, nothing saved yet
                return Ok(AppConfig::default());
            }
            Err(e) => return Err(ConfigError::ReadError(e.to_string())),
        };

        let config_file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        Ok(AppConfig {
            data_file: config_file.data_file,
            current_user: config_file.current_user,
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let config_file = ConfigFile {
            data_file: config.data_file.clone(),
            current_user: config.current_user.clone(),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        tracing::debug!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }

    fn default_data_file(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }
}
