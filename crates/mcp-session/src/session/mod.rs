//! MCP session engine
//!
//! - `core`: [`McpSession`], lifecycle operations and send primitives
//! - `builder`: [`SessionBuilder`] for construction
//! - `config`: [`SessionConfig`] timeouts and client identity
//! - `protocol`: JSON-RPC channel over the injected transport
//! - `dispatcher`: receive loop routing responses, notifications and server requests
//! - `pending`: pending request table with per-entry deadlines
//! - `lifecycle`: monotonic session state
//! - `operations`: typed MCP operations (tools, resources, prompts, ...)
//!
//! `McpSession` is cloneable via `Arc<SessionInner>`; every clone drives the
//! same connection.

pub mod builder;
pub mod config;
pub mod core;
pub(crate) mod dispatcher;
pub mod lifecycle;
pub mod operations;
pub(crate) mod pending;
pub(crate) mod protocol;

pub use self::builder::SessionBuilder;
pub use self::config::SessionConfig;
pub use self::core::McpSession;
pub use self::lifecycle::SessionState;
