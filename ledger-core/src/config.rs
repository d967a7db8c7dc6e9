//! Configuration for the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Transfer engine configuration
    pub engine: EngineConfig,

    /// Bootstrap wallet seeding
    pub seed: SeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            service_name: "wallet-ledger".to_string(),
            rocksdb: RocksDBConfig::default(),
            engine: EngineConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Transfer engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a unit of work waits for a row lock (milliseconds)
    pub lock_timeout_ms: i64,

    /// Retries after a lock conflict before giving up
    pub max_retries: u32,

    /// First retry delay (milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Retry delay cap (milliseconds)
    pub retry_max_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 1000,
            max_retries: 5,
            retry_initial_delay_ms: 5,
            retry_max_delay_ms: 200,
        }
    }
}

/// Wallets created on first start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Seed when the wallet table is empty
    pub enabled: bool,

    /// Number of `wallet-N` wallets
    pub wallet_count: u32,

    /// Opening balance of each seeded wallet
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_balance: Decimal,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wallet_count: 10,
            initial_balance: Decimal::ONE_HUNDRED,
        }
    }
}

impl Config {
    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<(), crate::StoreError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(crate::StoreError::Config(
                "data_dir cannot be empty".to_string(),
            ));
        }

        if self.engine.lock_timeout_ms <= 0 {
            return Err(crate::StoreError::Config(
                "engine.lock_timeout_ms must be positive".to_string(),
            ));
        }

        if self.engine.retry_initial_delay_ms > self.engine.retry_max_delay_ms {
            return Err(crate::StoreError::Config(
                "engine.retry_initial_delay_ms exceeds retry_max_delay_ms".to_string(),
            ));
        }

        if self.seed.initial_balance.is_sign_negative() {
            return Err(crate::StoreError::Config(
                "seed.initial_balance cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "wallet-ledger");
        assert!(config.seed.enabled);
        assert_eq!(config.seed.wallet_count, 10);
        assert_eq!(config.seed.initial_balance, Decimal::ONE_HUNDRED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/tmp/ledger"

            [engine]
            max_retries = 9

            [seed]
            initial_balance = 250.5
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ledger"));
        assert_eq!(config.engine.max_retries, 9);
        assert_eq!(config.engine.lock_timeout_ms, 1000);
        assert_eq!(config.seed.initial_balance, Decimal::new(2505, 1));
        assert_eq!(config.seed.wallet_count, 10);
    }

    #[test]
    fn test_validate_rejects_bad_retry_window() {
        let mut config = Config::default();
        config.engine.retry_initial_delay_ms = 500;
        config.engine.retry_max_delay_ms = 10;
        assert!(config.validate().is_err());
    }
}
