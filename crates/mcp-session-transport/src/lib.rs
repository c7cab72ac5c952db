//! # MCP Session Transport
//!
//! The duplex message channel a session runs over. A transport moves whole
//! JSON-RPC envelopes; framing (newline-delimited stdio, SSE, WebSocket
//! frames) is the implementation's concern.
//!
//! This crate defines:
//! - **Traits**: [`Transport`]
//! - **Types**: [`TransportType`], [`TransportState`], [`TransportMessage`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Implementations**: [`ChannelTransport`], an in-memory pair for tests and
//!   for embedding a client and server in one process
//!
//! ```rust
//! use mcp_session_transport::{ChannelTransport, Transport, TransportMessage};
//!
//! # tokio_test::block_on(async {
//! let (client, server) = ChannelTransport::pair();
//! client.connect().await?;
//! server.connect().await?;
//!
//! client.send(TransportMessage::new(&b"{}"[..])).await?;
//! let received = server.receive().await?.expect("peer is connected");
//! assert_eq!(&received.payload[..], b"{}");
//! # Ok::<(), mcp_session_transport::TransportError>(())
//! # }).unwrap();
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod channel;
mod error;
mod message;
mod traits;
mod types;

pub use channel::ChannelTransport;
pub use error::{TransportError, TransportResult};
pub use message::{TransportMessage, TransportMessageMetadata};
pub use traits::Transport;
pub use types::{TransportState, TransportType};
