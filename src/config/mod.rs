//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `TRIAGE_ENGINE` prefix
//! and nested values are separated by double underscores. Every section has
//! defaults, so an empty environment yields a working in-memory setup.
//!
//! # Example
//!
//! ```no_run
//! use triage_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Session cache holds {} entries", config.store.cache_capacity);
//! ```

mod error;
mod logging;
mod orchestrator;
mod redis;
mod rules;
mod store;

pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use orchestrator::OrchestratorConfig;
pub use redis::RedisConfig;
pub use rules::RulesConfig;
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Session cache and durable backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Redis connection, required only for the `redis` backend
    #[serde(default)]
    pub redis: RedisConfig,

    /// Rule table location
    #[serde(default)]
    pub rules: RulesConfig,

    /// Collaborator timeouts
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TRIAGE_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TRIAGE_ENGINE__STORE__CACHE_CAPACITY=500` -> `store.cache_capacity = 500`
    /// - `TRIAGE_ENGINE__STORE__BACKEND=redis` -> `store.backend = redis`
    /// - `TRIAGE_ENGINE__RULES__DIR=./rules` -> `rules.dir = ./rules`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRIAGE_ENGINE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Redis settings are only checked when Redis is the selected backend.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        if self.store.backend == StoreBackend::Redis {
            self.redis.validate()?;
        }
        self.orchestrator.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "TRIAGE_ENGINE__STORE__CACHE_CAPACITY",
        "TRIAGE_ENGINE__STORE__BACKEND",
        "TRIAGE_ENGINE__STORE__DATA_DIR",
        "TRIAGE_ENGINE__REDIS__URL",
        "TRIAGE_ENGINE__RULES__DIR",
        "TRIAGE_ENGINE__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.cache_capacity, 1000);
        assert!(config.rules.dir.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRIAGE_ENGINE__STORE__CACHE_CAPACITY", "500");
        env::set_var("TRIAGE_ENGINE__STORE__BACKEND", "file");
        env::set_var("TRIAGE_ENGINE__STORE__DATA_DIR", "/var/lib/triage");
        env::set_var("TRIAGE_ENGINE__RULES__DIR", "./rules");
        env::set_var("TRIAGE_ENGINE__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.store.cache_capacity, 500);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.data_dir, PathBuf::from("/var/lib/triage"));
        assert_eq!(config.rules.dir, Some(PathBuf::from("./rules")));
        assert!(config.logging.json);
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRIAGE_ENGINE__STORE__BACKEND", "redis");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("REDIS__URL"))
        );
    }

    #[test]
    fn test_redis_settings_ignored_for_memory_backend() {
        let config = AppConfig {
            redis: RedisConfig {
                url: "http://not-redis".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
