//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Bind host cannot be empty")]
    EmptyHost,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Broker URL override cannot be empty")]
    EmptyBrokerUrl,

    #[error("Audit log path cannot be empty")]
    EmptyAuditLogPath,
}
