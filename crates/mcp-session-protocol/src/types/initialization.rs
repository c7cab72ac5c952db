//! Types for the MCP connection initialization and handshake process.

use serde::{Deserialize, Serialize};

use super::{
    capabilities::{ClientCapabilities, ServerCapabilities},
    core::{Implementation, ProtocolVersion},
};

/// Protocol version this client proposes during the handshake
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Every protocol version this client can speak, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Whether `version` is one this client can speak
#[must_use]
pub fn is_supported_protocol_version(version: &str) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

/// The `initialize` request is sent by the client as the first message after connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// The protocol version the client wishes to use.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// The capabilities supported by the client.
    pub capabilities: ClientCapabilities,
    /// Information about the client's implementation.
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// The response to a successful `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// The protocol version chosen by the server.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,
    /// The capabilities supported by the server.
    pub capabilities: ServerCapabilities,
    /// Information about the server's implementation.
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    /// Optional human-readable instructions for the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Optional metadata for the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _meta: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supported_versions() {
        assert!(is_supported_protocol_version(LATEST_PROTOCOL_VERSION));
        assert!(is_supported_protocol_version("2024-11-05"));
        assert!(!is_supported_protocol_version("1999-01-01"));
    }

    #[test]
    fn test_initialize_result_parse() {
        let result: InitializeResult = serde_json::from_value(json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "srv", "version": "1.2.3"},
            "instructions": "be nice"
        }))
        .unwrap();
        assert_eq!(result.server_info.name, "srv");
        assert_eq!(result.instructions.as_deref(), Some("be nice"));
        assert!(result.capabilities.tools.is_some());
    }
}
