//! # MCP Session Protocol
//!
//! Wire-level building blocks for an MCP client session:
//!
//! - [`jsonrpc`] - JSON-RPC 2.0 envelopes and inbound message classification
//! - [`error`] - The [`McpError`] model shared by every session operation
//! - [`types`] - Typed payloads for the standard MCP methods
//! - [`methods`] - Method name constants
//!
//! ```rust
//! use mcp_session_protocol::jsonrpc::JsonRpcMessage;
//!
//! let msg = JsonRpcMessage::from_slice(br#"{"jsonrpc":"2.0","id":1,"result":{}}"#)?;
//! assert!(matches!(msg, JsonRpcMessage::Response(_)));
//! # Ok::<(), mcp_session_protocol::McpError>(())
//! ```

pub mod error;
pub mod jsonrpc;
pub mod methods;
pub mod types;

pub use error::{ErrorContext, ErrorKind, McpError, McpResult};
pub use jsonrpc::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
};
pub use types::initialization::{LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
