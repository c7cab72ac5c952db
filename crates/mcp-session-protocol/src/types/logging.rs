//! Logging types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::McpError;

/// Syslog-style severity levels used by `logging/setLevel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Notice
    Notice,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Critical
    Critical,
    /// Alert
    Alert,
    /// Emergency
    Emergency,
}

impl LoggingLevel {
    /// Wire name of the level
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::Alert => "alert",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for LoggingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggingLevel {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(McpError::invalid_argument("Logging level must not be null")),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "notice" => Ok(Self::Notice),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            "alert" => Ok(Self::Alert),
            "emergency" => Ok(Self::Emergency),
            other => Err(McpError::invalid_argument(format!(
                "Unknown logging level '{other}'"
            ))),
        }
    }
}

/// `logging/setLevel` parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLevelRequest {
    /// Minimum level the server should emit
    pub level: LoggingLevel,
}

/// `notifications/message` parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingMessageNotification {
    /// Severity
    pub level: LoggingLevel,
    /// Logger name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Arbitrary JSON payload
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_levels() {
        assert_eq!("debug".parse::<LoggingLevel>().unwrap(), LoggingLevel::Debug);
        assert_eq!(" Warning ".parse::<LoggingLevel>().unwrap(), LoggingLevel::Warning);
        assert!(LoggingLevel::Debug < LoggingLevel::Emergency);
    }

    #[test]
    fn test_empty_level_is_invalid_argument() {
        let err = "".parse::<LoggingLevel>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.message, "Logging level must not be null");

        let err = "verbose".parse::<LoggingLevel>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(
            serde_json::to_value(SetLevelRequest {
                level: LoggingLevel::Critical
            })
            .unwrap(),
            serde_json::json!({"level": "critical"})
        );
    }
}
