use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::services::registry::{StoreConfig, StoreConfigError};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub grpc_port: u16,
    pub http_port: u16,
    pub enable_http: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            grpc_port: 50051,
            http_port: 9999,
            enable_http: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub sweep_interval_ms: u64,
    pub instance_ttl_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1000,
            instance_ttl_ms: 3000,
        }
    }
}

// 环境变量覆盖项，SERVICE_PORT 沿用旧部署的变量名
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub service_port: Option<u16>,
    pub http_port: Option<u16>,
    pub registry_host: Option<String>,
    pub registry_enable_http: Option<bool>,
    pub sweep_interval_ms: Option<u64>,
    pub instance_ttl_ms: Option<u64>,
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid registry timings: {0}")]
    Store(#[from] StoreConfigError),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    // 加载配置：配置文件（可选）-> 环境变量覆盖 -> 校验
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let config_str = fs::read_to_string(path)?;
            Self::from_toml_str(&config_str)?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        let overrides: EnvOverrides = envy::from_env()?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn apply_overrides(&mut self, overrides: EnvOverrides) {
        if let Some(port) = overrides.service_port {
            self.server.grpc_port = port;
        }
        if let Some(port) = overrides.http_port {
            self.server.http_port = port;
        }
        if let Some(host) = overrides.registry_host {
            self.server.host = host;
        }
        if let Some(enable_http) = overrides.registry_enable_http {
            self.server.enable_http = enable_http;
        }
        if let Some(interval) = overrides.sweep_interval_ms {
            self.registry.sweep_interval_ms = interval;
        }
        if let Some(ttl) = overrides.instance_ttl_ms {
            self.registry.instance_ttl_ms = ttl;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_config().validate()?;
        if self.server.enable_http && self.server.http_port == self.server.grpc_port {
            return Err(ConfigError::Invalid(format!(
                "grpc_port and http_port must differ (both {})",
                self.server.grpc_port
            )));
        }
        Ok(())
    }

    pub fn grpc_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.server.host, self.server.grpc_port).parse()?)
    }

    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.server.host, self.server.http_port).parse()?)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            sweep_interval: Duration::from_millis(self.registry.sweep_interval_ms),
            instance_ttl: Duration::from_millis(self.registry.instance_ttl_ms),
        }
    }
}
