//! JSON-RPC channel over an injected transport.
//!
//! [`ProtocolChannel`] owns everything the receive loop and the callers share:
//! the transport, the pending request table, the lifecycle state and the
//! shutdown token. Callers go through [`ProtocolChannel::request`]:
//!
//! ```text
//! request()
//!   1. allocate "<prefix>-<n>" and register the pending entry
//!   2. reject if the session closed in the meantime
//!   3. write the request envelope
//!   4. wait for the receive loop to complete the entry, or the deadline
//! ```
//!
//! Registering before writing means a fast response can never arrive for an
//! id the table does not know yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use mcp_session_protocol::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, McpError, McpResult,
    RequestId,
};
use mcp_session_transport::{Transport, TransportMessage};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::lifecycle::Lifecycle;
use super::pending::{Completion, PendingGuard, PendingRequests};

pub(crate) struct ProtocolChannel {
    transport: Arc<dyn Transport>,
    pending: PendingRequests,
    lifecycle: Lifecycle,
    shutdown: CancellationToken,
    released: AtomicBool,
    id_prefix: String,
    next_id: AtomicU64,
}

impl ProtocolChannel {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        let mut id_prefix = uuid::Uuid::new_v4().simple().to_string();
        id_prefix.truncate(8);
        Self {
            transport,
            pending: PendingRequests::new(),
            lifecycle: Lifecycle::new(),
            shutdown: CancellationToken::new(),
            released: AtomicBool::new(false),
            id_prefix,
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn next_request_id(&self) -> RequestId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        RequestId::String(format!("{}-{}", self.id_prefix, n))
    }

    /// Connect the transport unless it already is.
    pub(crate) async fn connect(&self) -> McpResult<()> {
        if self.transport.is_connected().await {
            return Ok(());
        }
        self.transport.connect().await?;
        Ok(())
    }

    /// Send a request and wait for its outcome.
    ///
    /// # Errors
    ///
    /// `Rpc` for a peer error response, `Timeout` when `timeout` elapses,
    /// `SessionClosed` when the session closes first, `Transport` when the
    /// write fails.
    pub(crate) async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> McpResult<Value> {
        let id = self.next_request_id();
        let deadline = deadline_after(timeout);
        let receiver = self.pending.register(id.clone(), method, deadline)?;
        let _guard = PendingGuard::new(&self.pending, id.clone());

        // Checked after registering: a concurrent close either sees our entry
        // in fail_all or we see the closed state here.
        if self.lifecycle.is_closed() {
            return Err(McpError::session_closed("Session is closed").with_operation(method));
        }

        let request = JsonRpcRequest::new(method, params, id.clone());
        tracing::debug!("Sending request {} ({})", id, method);
        self.write(&JsonRpcMessage::Request(request), id.to_string())
            .await
            .map_err(|e| e.with_operation(method).with_request_id(id.to_string()))?;

        self.await_completion(&id, method, receiver, deadline, timeout)
            .await
    }

    async fn await_completion(
        &self,
        id: &RequestId,
        method: &str,
        mut receiver: oneshot::Receiver<Completion>,
        deadline: Instant,
        timeout: Duration,
    ) -> McpResult<Value> {
        match tokio::time::timeout_at(deadline, &mut receiver).await {
            Ok(completion) => completion.unwrap_or_else(|_| Err(connection_closed())),
            Err(_) => {
                if self.pending.expire(id) {
                    tracing::warn!("Request {} ({}) timed out after {:?}", id, method, timeout);
                    Err(McpError::timeout(format!(
                        "Request '{method}' timed out after {}ms",
                        timeout.as_millis()
                    ))
                    .with_operation(method)
                    .with_request_id(id.to_string()))
                } else {
                    // The response took the entry just before the deadline.
                    receiver
                        .await
                        .unwrap_or_else(|_| Err(connection_closed()))
                }
            }
        }
    }

    /// Send a notification. No response is expected.
    pub(crate) async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        if self.lifecycle.is_closed() {
            return Err(McpError::session_closed("Session is closed").with_operation(method));
        }
        tracing::debug!("Sending notification {}", method);
        let notification = JsonRpcNotification::new(method, params);
        self.write(&JsonRpcMessage::Notification(notification), method.to_string())
            .await
            .map_err(|e| e.with_operation(method))
    }

    /// Answer a server-initiated request.
    pub(crate) async fn respond(&self, response: JsonRpcResponse) -> McpResult<()> {
        let correlation = response
            .id
            .as_ref()
            .map_or_else(|| "response".to_string(), ToString::to_string);
        self.write(&JsonRpcMessage::Response(response), correlation)
            .await
    }

    async fn write(&self, message: &JsonRpcMessage, correlation_id: String) -> McpResult<()> {
        let payload = message.to_vec()?;
        self.transport
            .send(TransportMessage::json(payload, correlation_id))
            .await?;
        Ok(())
    }

    /// Route an inbound response to its waiter.
    pub(crate) fn complete(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.clone() else {
            tracing::warn!("Received response with null id");
            return;
        };
        if !self.pending.complete(&id, response.into_result()) {
            tracing::warn!("Received response for unknown or expired request {}", id);
        }
    }

    /// Stop the receive loop and disconnect the transport. Runs once.
    pub(crate) async fn release(&self) {
        if !self.begin_release() {
            return;
        }
        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!("Transport disconnect failed: {}", e);
        }
    }

    /// Cancel background tasks without touching the transport.
    ///
    /// Returns `true` for the first caller, which then owns the disconnect.
    pub(crate) fn begin_release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.shutdown.cancel();
        true
    }

    /// Close the session and fail everything still pending with `error`.
    pub(crate) async fn terminate(&self, error: McpError) {
        self.lifecycle.close();
        let failed = self.pending.fail_all(&error);
        if failed > 0 {
            tracing::info!("Failed {} pending request(s): {}", failed, error.message);
        }
        self.release().await;
    }
}

impl std::fmt::Debug for ProtocolChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolChannel")
            .field("transport", &self.transport)
            .field("state", &self.lifecycle.state())
            .field("pending", &self.pending.len())
            .field("id_prefix", &self.id_prefix)
            .finish()
    }
}

/// Roughly 30 years, the horizon tokio itself uses for "no deadline".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, saturating instead of overflowing the clock.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

pub(crate) fn connection_closed() -> McpError {
    McpError::session_closed("connection closed")
}
