//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `BRIDGE` prefix
//! and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use topic_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Gateway on {}", config.server.socket_addr());
//! ```

mod audit;
mod broker;
mod error;
mod server;

pub use audit::AuditConfig;
pub use broker::BrokerConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server configuration (bind host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Embedded broker configuration
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Traffic audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `BRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `BRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BRIDGE__BROKER__PORT=5050` -> `broker.port = 5050`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("BRIDGE__SERVER__PORT");
        env::remove_var("BRIDGE__SERVER__HOST");
        env::remove_var("BRIDGE__SERVER__ENVIRONMENT");
        env::remove_var("BRIDGE__BROKER__PORT");
        env::remove_var("BRIDGE__BROKER__URL");
        env::remove_var("BRIDGE__AUDIT__ENABLED");
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.broker.host, "127.0.0.1");
        assert_eq!(config.broker.port, 5050);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_ports() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("BRIDGE__SERVER__PORT", "3000");
        env::set_var("BRIDGE__BROKER__PORT", "4222");
        let config = AppConfig::load().unwrap();
        clear_env();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.broker.port, 4222);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("BRIDGE__SERVER__ENVIRONMENT", "production");
        let config = AppConfig::load().unwrap();
        clear_env();

        assert!(config.is_production());
    }

    #[test]
    fn test_broker_url_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("BRIDGE__BROKER__URL", "bus://10.0.0.5:5050");
        let config = AppConfig::load().unwrap();
        clear_env();

        assert_eq!(config.broker.url.as_deref(), Some("bus://10.0.0.5:5050"));
    }
}
