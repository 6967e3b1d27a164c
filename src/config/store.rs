//! Session store configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where session records are kept durably
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory only; lost on exit
    #[default]
    Memory,
    /// JSON files under `data_dir`
    File,
    /// Redis, see [`super::RedisConfig`]
    Redis,
}

/// Session store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Maximum sessions held in the in-memory cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_capacity == 0 {
            return Err(ValidationError::InvalidCacheCapacity);
        }
        if self.backend == StoreBackend::File && self.data_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORE__DATA_DIR"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_cache_capacity() -> usize {
    crate::application::DEFAULT_CACHE_CAPACITY
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_memory_backend() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.cache_capacity, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = StoreConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCacheCapacity));
    }

    #[test]
    fn file_backend_needs_a_directory() {
        let config = StoreConfig {
            backend: StoreBackend::File,
            data_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
