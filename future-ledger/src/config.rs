//! Configuration for the future ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Ledger configuration
    pub ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/future-ledger"),
            rocksdb: RocksDBConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 4,
            enable_statistics: false,
        }
    }
}

/// Ledger behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maturity bucket granularity (milliseconds)
    ///
    /// Every scheduled credit is truncated down to a multiple of this
    /// before it is stored. Must never change once a store holds data.
    pub bucket_granularity_ms: i64,

    /// Maximum page size accepted by queries
    pub max_page_size: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            bucket_granularity_ms: 86_400_000, // one day
            max_page_size: 1_000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("FUTURE_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(ms) = std::env::var("FUTURE_LEDGER_BUCKET_MS") {
            config.ledger.bucket_granularity_ms = ms
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid bucket granularity: {}", e)))?;
        }

        if let Ok(size) = std::env::var("FUTURE_LEDGER_MAX_PAGE_SIZE") {
            config.ledger.max_page_size = size
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid max page size: {}", e)))?;
        }

        Ok(config)
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> crate::Result<()> {
        if self.ledger.bucket_granularity_ms <= 0 {
            return Err(crate::Error::Config(
                "bucket_granularity_ms must be positive".to_string(),
            ));
        }
        if self.ledger.max_page_size == 0 {
            return Err(crate::Error::Config(
                "max_page_size must be positive".to_string(),
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
        assert_eq!(config.ledger.bucket_granularity_ms, 86_400_000);
        assert_eq!(config.ledger.max_page_size, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_granularity() {
        let mut config = Config::default();
        config.ledger.bucket_granularity_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_reads_ledger_settings() {
        std::env::set_var("FUTURE_LEDGER_BUCKET_MS", "3600000");
        std::env::set_var("FUTURE_LEDGER_MAX_PAGE_SIZE", "250");

        let config = Config::from_env().unwrap();
        assert_eq!(config.ledger.bucket_granularity_ms, 3_600_000);
        assert_eq!(config.ledger.max_page_size, 250);

        std::env::remove_var("FUTURE_LEDGER_BUCKET_MS");
        std::env::remove_var("FUTURE_LEDGER_MAX_PAGE_SIZE");
    }
}
