//! Gateway configuration

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Gateway configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Deployment profile
    pub env: RuntimeEnv,
    /// HTTP listener
    pub server: ServerConfig,
    /// Ledger store and engine settings
    #[serde(default)]
    pub ledger: wallet_ledger::Config,
}

/// Deployment profile; selects the log format and the config file
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    /// Human-readable logs
    Development,
    /// JSON logs
    Production,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Socket address to listen on
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Build from defaults, the profile file and `PAYMENT__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("PAYMENT_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("env", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout_secs", 60)?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(Environment::with_prefix("PAYMENT").separator("__"));

        // Special handling for common env vars
        builder = builder.set_override("env", environment)?;

        if let Ok(storage_path) = env::var("STORAGE_PATH") {
            builder = builder.set_override("ledger.data_dir", storage_path)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject settings the gateway cannot start with
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.request_timeout_secs == 0 {
            return Err("Request timeout must be positive".to_string());
        }

        self.server.bind_addr()?;

        self.ledger.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            env: RuntimeEnv::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_secs: 60,
            },
            ledger: wallet_ledger::Config::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = test_config();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.server.bind_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.server.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = test_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_host() {
        let mut config = test_config();
        config.server.host = "not a host".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ledger_section_is_validated() {
        let mut config = test_config();
        config.ledger.engine.lock_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_parses_lowercase() {
        let env: RuntimeEnv = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, RuntimeEnv::Production);
        assert!(serde_json::from_str::<RuntimeEnv>("\"staging\"").is_err());
    }
}
