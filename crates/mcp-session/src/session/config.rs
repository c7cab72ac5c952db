//! Session configuration.

use std::time::Duration;

use mcp_session_protocol::types::{ClientCapabilities, Implementation};
use mcp_session_protocol::{LATEST_PROTOCOL_VERSION, McpError, McpResult};
use serde::{Deserialize, Serialize};

/// Construction-time settings for a session
///
/// Timeouts are stored in milliseconds so the struct round-trips through
/// configuration files unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name and version sent as `clientInfo`
    pub client_info: Implementation,

    /// Protocol version offered in `initialize`
    pub protocol_version: String,

    /// Capabilities declared in `initialize`
    pub capabilities: ClientCapabilities,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Handshake timeout in milliseconds
    pub initialization_timeout_ms: u64,

    /// How long `close_gracefully` waits for in-flight requests, in milliseconds
    pub graceful_shutdown_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_info: Implementation::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            request_timeout_ms: 20_000,          // 20 seconds
            initialization_timeout_ms: 20_000,   // 20 seconds
            graceful_shutdown_timeout_ms: 5_000, // 5 seconds
        }
    }
}

impl SessionConfig {
    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Handshake timeout
    #[must_use]
    pub fn initialization_timeout(&self) -> Duration {
        Duration::from_millis(self.initialization_timeout_ms)
    }

    /// Graceful shutdown budget
    #[must_use]
    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.graceful_shutdown_timeout_ms)
    }

    /// Check the settings a session cannot run without.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero request or initialization timeout.
    pub fn validate(&self) -> McpResult<()> {
        if self.request_timeout_ms == 0 {
            return Err(McpError::invalid_argument(
                "Request timeout must be greater than zero",
            ));
        }
        if self.initialization_timeout_ms == 0 {
            return Err(McpError::invalid_argument(
                "Initialization timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.initialization_timeout(), Duration::from_secs(20));
        assert_eq!(config.graceful_shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.protocol_version, LATEST_PROTOCOL_VERSION);
        assert_eq!(config.client_info.name, "mcp-session");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_value(json!({"request_timeout_ms": 1500})).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        assert_eq!(config.initialization_timeout_ms, 20_000);
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let config = SessionConfig {
            request_timeout_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().message,
            "Request timeout must be greater than zero"
        );

        let config = SessionConfig {
            initialization_timeout_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().message,
            "Initialization timeout must be greater than zero"
        );
    }
}
