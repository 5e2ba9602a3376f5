use crate::domain::User;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Overrides the default snapshot location.
    pub data_file: Option<PathBuf>,
    /// Identity chosen at the last login, if any.
    pub current_user: Option<User>,
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_config(&self) -> ConfigResult<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()>;
    /// Where the snapshot lives when nothing overrides it.
    fn default_data_file(&self) -> PathBuf;
}
