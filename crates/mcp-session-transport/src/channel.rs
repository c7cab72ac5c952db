//! In-memory transport backed by Tokio channels.
//!
//! [`ChannelTransport::pair`] returns two connected ends. Whatever one end
//! sends, the other receives in order. Disconnecting (or dropping) one end
//! ends the other end's inbound sequence with `Ok(None)` once buffered
//! messages are drained.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as TokioMutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{TransportError, TransportResult};
use crate::message::TransportMessage;
use crate::traits::Transport;
use crate::types::{TransportState, TransportType};

/// One end of an in-memory duplex channel.
///
/// ## Interior Mutability
///
/// - `state` and `outbound`: parking_lot mutex, never held across `.await`
/// - `inbound`: tokio mutex, held by the single receiver while it waits
#[derive(Debug)]
pub struct ChannelTransport {
    state: Mutex<TransportState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<TransportMessage>>>,
    inbound: TokioMutex<mpsc::UnboundedReceiver<TransportMessage>>,
    closed: CancellationToken,
}

impl ChannelTransport {
    /// Create two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    /// Create two connected ends, each behind an `Arc`.
    #[must_use]
    pub fn shared_pair() -> (Arc<Self>, Arc<Self>) {
        let (a, b) = Self::pair();
        (Arc::new(a), Arc::new(b))
    }

    fn new(
        outbound: mpsc::UnboundedSender<TransportMessage>,
        inbound: mpsc::UnboundedReceiver<TransportMessage>,
    ) -> Self {
        Self {
            state: Mutex::new(TransportState::Disconnected),
            outbound: Mutex::new(Some(outbound)),
            inbound: TokioMutex::new(inbound),
            closed: CancellationToken::new(),
        }
    }

    fn set_state(&self, new_state: TransportState) {
        let mut state = self.state.lock();
        if *state != new_state {
            trace!("Channel transport state: {} -> {}", *state, new_state);
            *state = new_state;
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Channel
    }

    async fn state(&self) -> TransportState {
        self.state.lock().clone()
    }

    async fn connect(&self) -> TransportResult<()> {
        if self.closed.is_cancelled() {
            return Err(TransportError::ConnectionFailed(
                "Channel transport was disconnected".to_string(),
            ));
        }
        self.set_state(TransportState::Connected);
        debug!("Channel transport connected");
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.set_state(TransportState::Disconnecting);
        // Dropping the sender ends the peer's inbound sequence.
        self.outbound.lock().take();
        self.closed.cancel();
        self.set_state(TransportState::Disconnected);
        debug!("Channel transport disconnected");
        Ok(())
    }

    async fn send(&self, message: TransportMessage) -> TransportResult<()> {
        let state = self.state.lock().clone();
        if !matches!(state, TransportState::Connected) {
            return Err(TransportError::ConnectionFailed(format!(
                "Transport not connected: {state}"
            )));
        }

        let size = message.size();
        let outbound = self.outbound.lock();
        let Some(sender) = outbound.as_ref() else {
            return Err(TransportError::SendFailed(
                "Channel transport is closed".to_string(),
            ));
        };
        sender
            .send(message)
            .map_err(|_| TransportError::ConnectionLost("Peer end was dropped".to_string()))?;
        trace!("Sent message: {} bytes", size);
        Ok(())
    }

    async fn receive(&self) -> TransportResult<Option<TransportMessage>> {
        if self.closed.is_cancelled() {
            return Ok(None);
        }

        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            () = self.closed.cancelled() => Ok(None),
            message = inbound.recv() => match message {
                Some(message) => {
                    trace!("Received message: {} bytes", message.size());
                    Ok(Some(message))
                }
                None => {
                    debug!("Channel peer disconnected");
                    self.set_state(TransportState::Disconnected);
                    Ok(None)
                }
            },
        }
    }
}
