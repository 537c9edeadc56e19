//! Layered server configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional TOML or YAML file
//! 3. `IVESCRIPTS_*` environment variables, `__` separating nested keys
//!    (e.g. `IVESCRIPTS_SERVER__PORT=8080`)
//! 4. the bare `API_KEY` variable, for deployments configured the old way

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "IVESCRIPTS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Configuration validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },
}

impl ConfigError {
    fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration for the script directory server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret expected in the `X-API-Key` header on mutating requests.
    /// Mutations are refused while this is unset.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Postgresql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory used by the file backend
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Connection URL used by the postgresql backend
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: None,
            connection_string: None,
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Build the figment for defaults, an optional file and the environment.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = file {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
            .merge(Env::raw().only(&["API_KEY"]).map(|_| "auth.api_key".into()))
    }

    /// Load and validate configuration.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(file).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-memory store, loopback address and a fixed key.
    pub fn test_config_with_port(port: u16) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port,
            },
            auth: AuthConfig {
                api_key: Some("test-api-key".to_string()),
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::validation("server.host", "must not be empty"));
        }

        if let Some(key) = &self.auth.api_key
            && key.is_empty()
        {
            return Err(ConfigError::validation(
                "auth.api_key",
                "must not be empty when set",
            ));
        }

        match self.store.backend {
            StoreBackend::Memory => {}
            StoreBackend::File => {
                if self.store.data_dir.is_none() {
                    return Err(ConfigError::validation(
                        "store.data_dir",
                        "required for the file backend",
                    ));
                }
            }
            StoreBackend::Postgresql => {
                if self.store.connection_string.is_none() {
                    return Err(ConfigError::validation(
                        "store.connection_string",
                        "required for the postgresql backend",
                    ));
                }
                if self.store.max_connections == 0 {
                    return Err(ConfigError::validation(
                        "store.max_connections",
                        "must be at least 1",
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
