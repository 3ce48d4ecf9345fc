//! Configuration module for pgcb-server.
//!
//! Loads the TOML file, applies CLI overrides, validates it and converts it
//! into the runtime value objects from `pgcb_core::config`.

pub mod file;

use crate::config::file::FileConfig;
use pgcb_core::config::{EventsConfig, GatewayConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Everything read from one load of the config file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub gateway: GatewayConfig,
    pub events: EventsConfig,
}

/// Reads and validates the configuration file.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the file, apply the CLI listen override and validate.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&content)
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.gateway.merchant_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "gateway.merchant_id must not be empty".to_string(),
        ));
    }
    if config.gateway.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "gateway.secret must not be empty".to_string(),
        ));
    }
    if config.events.forward_url.is_some() && config.events.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "events.secret is required when events.forward_url is set".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        listen: file_config.server.listen,
        gateway: GatewayConfig::new(
            file_config.gateway.merchant_id,
            file_config.gateway.secret.into_bytes(),
        ),
        events: EventsConfig {
            forward_url: file_config.events.forward_url,
            secret: file_config.events.secret.into_bytes().into_boxed_slice(),
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[gateway]
merchant_id = "M-1"
secret = "gateway-secret"
"#;

    #[test]
    fn test_listen_override_wins() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = ConfigLoader::new("unused.toml", Some(addr))
            .load_str(BASE)
            .unwrap();
        assert_eq!(loaded.listen, addr);
        assert_eq!(loaded.gateway.merchant_id, "M-1");
        assert_eq!(loaded.gateway.secret_bytes(), b"gateway-secret");
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let content = r#"
[gateway]
merchant_id = "M-1"
secret = ""
"#;
        let err = ConfigLoader::new("unused.toml", None)
            .load_str(content)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_forward_url_requires_secret() {
        let content = format!("{BASE}\n[events]\nforward_url = \"https://example.com/events\"\n");
        let err = ConfigLoader::new("unused.toml", None)
            .load_str(&content)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLoader::new("/nonexistent/pgcb-config.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
