//! Traffic audit logging configuration

use std::path::PathBuf;

use serde::Deserialize;

use super::error::ValidationError;

/// Traffic audit logging configuration
///
/// The audit collaborator records every broker message to an append-only
/// file. NOTE: the default path under `/var/log` typically requires
/// elevated privileges; override it (or disable auditing) for development.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether the traffic logger runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// File all broker traffic is appended to
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyAuditLogPath);
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            log_path: default_log_path(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from("/var/log/topic-bridge/traffic.log")
}
