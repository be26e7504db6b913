//! Load — config loading from file and environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::WatcherConfig;

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "WATCHER_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "/etc/docker-watcher/watcher.toml";

/// Environment variable overriding the endpoint descriptor.
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl WatcherConfig {
    /// Load configuration.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var(CONFIG_FILE_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&config_path), std::env::var(DOCKER_HOST_ENV).ok())
    }

    fn load_from(path: &Path, docker_host: Option<String>) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", path.display());
            Self::default()
        };

        if let Some(host) = docker_host {
            config.docker_host = host;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
