//! Session error model.
//!
//! A single error type, [`McpError`], is surfaced by every session
//! operation. [`ErrorKind`] tells callers what happened without string
//! matching:
//!
//! - `InvalidArgument` errors are raised before anything reaches the wire
//!   and are never retried.
//! - `Rpc` errors carry the peer's `code`, `message` and `data` verbatim.
//! - `SessionClosed` covers calls after close, requests pending at close, and
//!   connection loss.
//!
//! ## Example
//!
//! ```rust
//! use mcp_session_protocol::error::{ErrorKind, McpError, McpResult};
//!
//! fn lookup(uri: &str) -> McpResult<()> {
//!     Err(McpError::not_found(format!("Root with uri '{uri}' not found")))
//! }
//!
//! let err = lookup("file:///a").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::NotFound);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result type alias for session operations
pub type McpResult<T> = std::result::Result<T, McpError>;

/// Unified session error type
///
/// The `context` field is boxed to keep `Result<T, McpError>` small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Peer-supplied JSON-RPC code (set for `ErrorKind::Rpc`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Peer-supplied error data (set for `ErrorKind::Rpc`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Box<ErrorContext>>,
}

/// Additional error context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Operation being performed (usually the JSON-RPC method)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error classification for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied an invalid argument; nothing was sent
    InvalidArgument,
    /// Request deadline elapsed before a response arrived
    Timeout,
    /// Peer answered with a JSON-RPC error
    Rpc,
    /// Referenced entity does not exist
    NotFound,
    /// Session closed, or the connection was lost
    SessionClosed,
    /// A request id is already in flight
    DuplicateRequestId,
    /// Transport failed to connect, send, or receive
    Transport,
    /// Payload could not be encoded or decoded
    Serialization,
    /// Peer negotiated a protocol version this client does not speak
    ProtocolVersion,
    /// No handler exists for a server-initiated request
    MethodNotFound,
    /// Internal failure
    Internal,
}

impl McpError {
    /// Create a new error with kind and message
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            data: None,
            context: None,
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create an error mirroring a peer's JSON-RPC error
    #[must_use]
    pub fn rpc(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code: Some(code),
            data,
            ..Self::new(ErrorKind::Rpc, message)
        }
    }

    /// Create a not-found error
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a session-closed error
    #[must_use]
    pub fn session_closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionClosed, message)
    }

    /// Create a duplicate request id error
    #[must_use]
    pub fn duplicate_request_id(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::DuplicateRequestId,
            format!("Request id '{id}' is already pending"),
        )
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a protocol version mismatch error
    #[must_use]
    pub fn protocol_version(server_version: &str, supported: &[&str]) -> Self {
        Self::new(
            ErrorKind::ProtocolVersion,
            format!(
                "Unsupported protocol version '{}' (supported: {})",
                server_version,
                supported.join(", ")
            ),
        )
    }

    /// Create a method not found error
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MethodNotFound,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Set the operation context
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        let ctx = self
            .context
            .get_or_insert_with(|| Box::new(ErrorContext::default()));
        ctx.operation = Some(operation.into());
        self
    }

    /// Set the request ID context
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        let ctx = self
            .context
            .get_or_insert_with(|| Box::new(ErrorContext::default()));
        ctx.request_id = Some(request_id.into());
        self
    }

    /// Whether the session can no longer be used after this error
    #[must_use]
    pub const fn is_session_closed(&self) -> bool {
        matches!(self.kind, ErrorKind::SessionClosed)
    }

    /// Get the JSON-RPC error code for this error
    ///
    /// Peer errors keep their original code.
    #[must_use]
    pub fn jsonrpc_code(&self) -> i32 {
        if let Some(code) = self.code {
            return code;
        }
        match self.kind {
            ErrorKind::InvalidArgument | ErrorKind::Serialization => -32602,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::Internal | ErrorKind::Rpc => -32603,
            ErrorKind::NotFound => -32002,
            ErrorKind::ProtocolVersion => -32007,
            ErrorKind::Timeout => -32012,
            ErrorKind::Transport => -32014,
            ErrorKind::SessionClosed => -32000,
            ErrorKind::DuplicateRequestId => -32600,
        }
    }
}

impl ErrorKind {
    /// Get a human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidArgument => "Invalid argument",
            Self::Timeout => "Operation timed out",
            Self::Rpc => "Peer returned an error",
            Self::NotFound => "Not found",
            Self::SessionClosed => "Session closed",
            Self::DuplicateRequestId => "Duplicate request id",
            Self::Transport => "Transport error",
            Self::Serialization => "Serialization error",
            Self::ProtocolVersion => "Unsupported protocol version",
            Self::MethodNotFound => "Method not found",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{}] ", code)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(ctx) = &self.context {
            if let Some(op) = &ctx.operation {
                write!(f, " (operation: {})", op)?;
            }
            if let Some(id) = &ctx.request_id {
                write!(f, " (request: {})", id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for McpError {}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization, format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_creation() {
        let err = McpError::invalid_argument("Root must not be null");
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "Root must not be null");
        assert!(err.code.is_none());
    }

    #[test]
    fn test_rpc_error_keeps_peer_fields() {
        let err = McpError::rpc(-32050, "tool exploded", Some(json!({"detail": 1})));
        assert_eq!(err.kind, ErrorKind::Rpc);
        assert_eq!(err.jsonrpc_code(), -32050);
        assert_eq!(err.data, Some(json!({"detail": 1})));
        assert_eq!(err.to_string(), "[-32050] tool exploded");
    }

    #[test]
    fn test_error_context() {
        let err = McpError::timeout("Request timed out after 10ms")
            .with_operation("tools/list")
            .with_request_id("abc-3");

        let ctx = err.context.clone().unwrap();
        assert_eq!(ctx.operation.as_deref(), Some("tools/list"));
        assert_eq!(ctx.request_id.as_deref(), Some("abc-3"));
        assert_eq!(
            err.to_string(),
            "Request timed out after 10ms (operation: tools/list) (request: abc-3)"
        );
    }

    #[test]
    fn test_jsonrpc_codes() {
        assert_eq!(McpError::method_not_found("x").jsonrpc_code(), -32601);
        assert_eq!(McpError::internal("x").jsonrpc_code(), -32603);
        assert_eq!(McpError::invalid_argument("x").jsonrpc_code(), -32602);
        assert_eq!(McpError::timeout("x").jsonrpc_code(), -32012);
    }

    #[test]
    fn test_protocol_version_message() {
        let err = McpError::protocol_version("1999-01-01", &["2025-06-18", "2024-11-05"]);
        assert_eq!(err.kind, ErrorKind::ProtocolVersion);
        assert!(err.message.contains("1999-01-01"));
        assert!(err.message.contains("2025-06-18, 2024-11-05"));
    }
}
