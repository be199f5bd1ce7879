use std::net::SocketAddr;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LogError;

/// Prefix for environment overrides, e.g. `MERKLE_LOG_SERVER_PORT`
pub const ENV_PREFIX: &str = "MERKLE_LOG";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "merkle-log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    #[serde(default)]
    pub seed_log_path: Option<String>,
    pub log_server_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, LogError> {
        Self::load_from(None)
    }

    /// Layer defaults, a TOML file and `MERKLE_LOG_*` environment variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, LogError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 3000)?
            .set_default("log_server_url", "http://127.0.0.1:3000")?
            .set_default("request_timeout_secs", 30)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        info!("Configuration loaded");
        Ok(config)
    }

    pub fn bind_address(&self) -> Result<SocketAddr, LogError> {
        format!("{}:{}", self.server_host, self.server_port)
            .parse()
            .map_err(|e| {
                LogError::ConfigError(format!(
                    "Invalid bind address {}:{}: {}",
                    self.server_host, self.server_port, e
                ))
            })
    }

    /// Contents of the seed file, or an empty log when none is configured
    pub fn load_seed(&self) -> Result<String, LogError> {
        match &self.seed_log_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                LogError::ConfigError(format!("Failed to read seed log {}: {}", path, e))
            }),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "server_host = \"127.0.0.1\"").unwrap();
        writeln!(file, "server_port = 8081").unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 8081);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(
            config.bind_address().unwrap(),
            "127.0.0.1:8081".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = AppConfig::load_from(Some(&missing)).unwrap_err();
        assert!(matches!(err, LogError::ConfigError(_)));
    }

    #[test]
    fn test_load_seed() {
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        write!(seed, "a\nb\nc\n").unwrap();

        let mut config = AppConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            seed_log_path: None,
            log_server_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        };
        assert_eq!(config.load_seed().unwrap(), "");

        config.seed_log_path = Some(seed.path().to_string_lossy().to_string());
        assert_eq!(config.load_seed().unwrap(), "a\nb\nc\n");

        config.server_host = "not a host".to_string();
        assert!(config.bind_address().is_err());
    }
}
