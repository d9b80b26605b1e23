//! Embedded broker configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Embedded broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Host address the broker binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the broker listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection URL override; when set, clients are pointed at an
    /// external broker instead of the embedded one
    pub url: Option<String>,
}

impl BrokerConfig {
    /// The URL clients should connect to
    pub fn client_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("bus://{}:{}", self.host, self.port))
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(ValidationError::EmptyBrokerUrl);
            }
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            url: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5050
}
