//! Inbound message routing.
//!
//! One routing task per session is the only caller of `transport.receive()`.
//! It classifies each envelope and routes it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  routing task                                        │
//! │  loop {                                              │
//! │    msg = transport.receive().await                   │
//! │    Response     => pending table (by id)             │
//! │    Notification => queue -> delivery task (ordered)  │
//! │    Request      => spawned task -> handler table     │
//! │                    -> response written back          │
//! │  }                                                   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications go through a single delivery task so every consumer sees
//! them in transport order, and a slow consumer never stalls response
//! routing. Reverse requests each get their own task so a slow handler cannot
//! block the responses a caller is waiting for.
//!
//! End of stream, or a receive error once the transport reports itself down,
//! closes the session and fails every pending request with
//! "connection closed".

use std::sync::{Arc, Weak};
use std::time::Duration;

use mcp_session_protocol::{JsonRpcMessage, JsonRpcNotification};
use mcp_session_transport::TransportState;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::core::{McpSession, SessionInner};
use super::protocol::{ProtocolChannel, connection_closed};
use crate::handlers::RequestHandlerTable;
use crate::notifications::NotificationDispatcher;

/// Consecutive receive errors tolerated before the connection is given up
const MAX_CONSECUTIVE_ERRORS: u32 = 20;

/// Start the routing and delivery tasks for a session.
pub(crate) fn spawn(
    protocol: Arc<ProtocolChannel>,
    handlers: Arc<RequestHandlerTable>,
    notifications: Arc<NotificationDispatcher>,
    session: Weak<SessionInner>,
) {
    let (queue, deliveries) = mpsc::unbounded_channel();
    tokio::spawn(run_delivery(deliveries, notifications, session));
    tokio::spawn(run_routing(protocol, handlers, queue));
}

async fn run_routing(
    protocol: Arc<ProtocolChannel>,
    handlers: Arc<RequestHandlerTable>,
    queue: mpsc::UnboundedSender<JsonRpcNotification>,
) {
    info!("Message dispatcher routing task started");
    let shutdown = protocol.shutdown_token();
    let transport = Arc::clone(protocol.transport());
    let mut consecutive_errors = 0u32;

    loop {
        let received = tokio::select! {
            () = shutdown.cancelled() => {
                debug!("Message dispatcher routing task shutting down");
                break;
            }
            received = transport.receive() => received,
        };

        match received {
            Ok(Some(message)) => {
                consecutive_errors = 0;
                route(&protocol, &handlers, &queue, &message.payload);
            }
            Ok(None) => {
                info!("Transport closed by peer");
                protocol.terminate(connection_closed()).await;
                break;
            }
            Err(e) => {
                consecutive_errors += 1;
                let state = transport.state().await;
                let is_fatal = matches!(
                    state,
                    TransportState::Disconnected | TransportState::Failed { .. }
                ) || consecutive_errors > MAX_CONSECUTIVE_ERRORS;

                if is_fatal {
                    error!(
                        "Transport receive failed ({} consecutive, state {}): {}",
                        consecutive_errors, state, e
                    );
                    protocol.terminate(connection_closed()).await;
                    break;
                }

                if consecutive_errors == 1 {
                    error!("Transport receive error: {}", e);
                } else {
                    warn!(
                        "Transport receive error (attempt {}): {}",
                        consecutive_errors, e
                    );
                }

                let delay_ms = 100u64.saturating_mul(2u64.saturating_pow(consecutive_errors.min(5)));
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                }
            }
        }
    }

    info!("Message dispatcher routing task terminated");
}

fn route(
    protocol: &Arc<ProtocolChannel>,
    handlers: &Arc<RequestHandlerTable>,
    queue: &mpsc::UnboundedSender<JsonRpcNotification>,
    payload: &[u8],
) {
    let message = match JsonRpcMessage::from_slice(payload) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping malformed message: {}", e);
            return;
        }
    };

    match message {
        JsonRpcMessage::Response(response) => {
            trace!("Routing response {:?}", response.id);
            protocol.complete(response);
        }
        JsonRpcMessage::Notification(notification) => {
            trace!("Queueing notification {}", notification.method);
            if queue.send(notification).is_err() {
                debug!("Notification delivery has stopped, dropping notification");
            }
        }
        JsonRpcMessage::Request(request) => {
            debug!(
                "Routing server-initiated request: method={}, id={}",
                request.method, request.id
            );
            let protocol = Arc::clone(protocol);
            let handlers = Arc::clone(handlers);
            tokio::spawn(async move {
                let response = handlers.dispatch(request).await;
                if let Err(e) = protocol.respond(response).await {
                    warn!("Failed to answer server request: {}", e);
                }
            });
        }
    }
}

async fn run_delivery(
    mut deliveries: mpsc::UnboundedReceiver<JsonRpcNotification>,
    notifications: Arc<NotificationDispatcher>,
    session: Weak<SessionInner>,
) {
    while let Some(notification) = deliveries.recv().await {
        let Some(inner) = session.upgrade() else {
            debug!("Session dropped, stopping notification delivery");
            break;
        };
        let session = McpSession::from_inner(inner);
        notifications.dispatch(notification, &session).await;
    }
    trace!("Notification delivery task terminated");
}
