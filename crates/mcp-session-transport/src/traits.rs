//! Core transport trait.

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::message::TransportMessage;
use crate::types::{TransportState, TransportType};

/// A message-based duplex channel to an MCP server.
///
/// A session keeps exactly one task calling [`Transport::receive`]; sends may
/// come from any task concurrently.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Returns the type of this transport.
    fn transport_type(&self) -> TransportType;

    /// Returns the current state of the transport.
    async fn state(&self) -> TransportState;

    /// Establishes a connection to the remote endpoint.
    async fn connect(&self) -> TransportResult<()>;

    /// Closes the connection to the remote endpoint.
    async fn disconnect(&self) -> TransportResult<()>;

    /// Sends one envelope.
    async fn send(&self, message: TransportMessage) -> TransportResult<()>;

    /// Receives the next envelope.
    ///
    /// Yields `Ok(None)` once the peer is gone and no more messages will
    /// arrive.
    async fn receive(&self) -> TransportResult<Option<TransportMessage>>;

    /// Returns `true` if the transport is currently in the `Connected` state.
    async fn is_connected(&self) -> bool {
        matches!(self.state().await, TransportState::Connected)
    }
}
