//! The session engine.
//!
//! `McpSession` is a cheaply-cloneable handle over `Arc<SessionInner>`. All
//! clones share one transport, one pending request table and one lifecycle:
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Initializing ──ok──▶ Ready
//!         │                              │                 │
//!         └──────────close()─────────────┴──fail/close()───┴──▶ Closed
//! ```
//!
//! Any request or notification issued while `Uninitialized` runs the
//! handshake first. Concurrent first calls share a single handshake: the
//! first caller spawns it, everyone awaits the same shared outcome, and the
//! handshake keeps running even if the caller that started it goes away.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    ClientCapabilities, Implementation, InitializeRequest, InitializeResult, Root,
    ServerCapabilities, Tool, Prompt, Resource, LoggingMessageNotification,
    ProgressNotification, ResourceUpdatedNotification, is_supported_protocol_version,
};
use mcp_session_protocol::{McpError, McpResult, SUPPORTED_PROTOCOL_VERSIONS};
use mcp_session_transport::Transport;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::builder::SessionBuilder;
use super::config::SessionConfig;
use super::dispatcher;
use super::lifecycle::SessionState;
use super::protocol::ProtocolChannel;
use crate::capabilities::CapabilityRegistry;
use crate::handlers::{RequestHandler, RequestHandlerTable};
use crate::notifications::{NotificationConsumer, NotificationDispatcher};
use crate::roots::RootRegistry;

type HandshakeFuture = Shared<BoxFuture<'static, McpResult<InitializeResult>>>;

/// Shared session state
pub(crate) struct SessionInner {
    pub(crate) protocol: Arc<ProtocolChannel>,
    pub(crate) config: SessionConfig,
    pub(crate) capabilities: CapabilityRegistry,
    pub(crate) handlers: Arc<RequestHandlerTable>,
    pub(crate) notifications: Arc<NotificationDispatcher>,
    pub(crate) roots: Arc<RootRegistry>,
    handshake: Mutex<Option<HandshakeFuture>>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        // Last handle gone: stop the background tasks and let go of the transport.
        debug!("Last session handle dropped, shutting down");
        self.protocol.lifecycle().close();
        self.protocol
            .pending()
            .fail_all(&McpError::session_closed("Session dropped"));
        if self.protocol.begin_release() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let transport = Arc::clone(self.protocol.transport());
                handle.spawn(async move {
                    if let Err(e) = transport.disconnect().await {
                        warn!("Transport disconnect failed: {}", e);
                    }
                });
            }
        }
    }
}

/// A client session with one MCP server
///
/// Cloning is cheap and every clone drives the same session.
///
/// ```rust,no_run
/// use mcp_session::McpSession;
/// use mcp_session_transport::ChannelTransport;
///
/// # async fn example() -> mcp_session_protocol::McpResult<()> {
/// let (client_end, _server_end) = ChannelTransport::pair();
/// let session = McpSession::builder().with_transport(client_end).build()?;
///
/// // The first call performs the handshake.
/// let tools = session.list_all_tools().await?;
/// println!("{} tools", tools.len());
///
/// let background = session.clone();
/// tokio::spawn(async move { background.ping().await });
///
/// session.close_gracefully().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct McpSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl McpSession {
    /// Start configuring a session
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        config: SessionConfig,
        handlers: Arc<RequestHandlerTable>,
        notifications: Arc<NotificationDispatcher>,
        roots: Arc<RootRegistry>,
    ) -> Self {
        let capabilities = CapabilityRegistry::new(config.capabilities.clone());
        Self {
            inner: Arc::new(SessionInner {
                protocol: Arc::new(ProtocolChannel::new(transport)),
                config,
                capabilities,
                handlers,
                notifications,
                roots,
                handshake: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    // ============================================================================
    // LIFECYCLE
    // ============================================================================

    /// Perform the handshake, or return the result of the one already done.
    ///
    /// Connects the transport if needed, sends `initialize` with the local
    /// capabilities, checks the server's protocol version, records the
    /// server's capabilities and sends `notifications/initialized`.
    ///
    /// # Errors
    ///
    /// `Timeout` if the server does not answer within the initialization
    /// timeout, `Rpc` if it answers with an error, `ProtocolVersion` for an
    /// unsupported version, `Transport` if the connection fails, and
    /// `SessionClosed` if the session was closed first. Any failure closes
    /// the session, and every caller waiting on the handshake gets the same
    /// error.
    pub async fn initialize(&self) -> McpResult<InitializeResult> {
        self.initialize_with_timeout(self.inner.config.initialization_timeout())
            .await
    }

    /// [`initialize`](Self::initialize) with an explicit handshake deadline.
    ///
    /// When a handshake is already running, `timeout` is ignored and the
    /// caller waits for that handshake.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero timeout, otherwise as for
    /// [`initialize`](Self::initialize).
    pub async fn initialize_with_timeout(&self, timeout: Duration) -> McpResult<InitializeResult> {
        if timeout.is_zero() {
            return Err(McpError::invalid_argument(
                "Initialization timeout must be greater than zero",
            ));
        }
        if self.is_closed() {
            return Err(
                McpError::session_closed("Session is closed").with_operation(methods::INITIALIZE)
            );
        }
        if let Some(result) = self.inner.capabilities.initialize_result() {
            return Ok(result.clone());
        }

        let handshake = {
            let mut slot = self.inner.handshake.lock();
            slot.get_or_insert_with(|| {
                let session = self.clone();
                let protocol = Arc::clone(&self.inner.protocol);
                let task = tokio::spawn(async move { session.run_handshake(timeout).await });
                async move {
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!("Handshake task failed: {}", e);
                            let err = McpError::internal(format!("Handshake task failed: {e}"))
                                .with_operation(methods::INITIALIZE);
                            protocol
                                .terminate(McpError::session_closed(format!(
                                    "Initialization failed: {}",
                                    err.message
                                )))
                                .await;
                            Err(err)
                        }
                    }
                }
                .boxed()
                .shared()
            })
            .clone()
        };
        handshake.await
    }

    async fn run_handshake(&self, timeout: Duration) -> McpResult<InitializeResult> {
        let protocol = &self.inner.protocol;
        if !protocol
            .lifecycle()
            .transition(SessionState::Uninitialized, SessionState::Initializing)
        {
            return Err(
                McpError::session_closed("Session is closed").with_operation(methods::INITIALIZE)
            );
        }

        match self.negotiate(timeout).await {
            Ok(result) => {
                if !protocol.lifecycle().advance(SessionState::Ready) {
                    return Err(McpError::session_closed("Session closed during initialization")
                        .with_operation(methods::INITIALIZE));
                }
                info!(
                    "Session ready: server {} {} (protocol {})",
                    result.server_info.name, result.server_info.version, result.protocol_version
                );
                Ok(result)
            }
            Err(e) => {
                error!("Initialization failed: {}", e);
                protocol
                    .terminate(McpError::session_closed(format!(
                        "Initialization failed: {}",
                        e.message
                    )))
                    .await;
                Err(e)
            }
        }
    }

    async fn negotiate(&self, timeout: Duration) -> McpResult<InitializeResult> {
        let inner = &self.inner;
        inner.protocol.connect().await?;
        dispatcher::spawn(
            Arc::clone(&inner.protocol),
            Arc::clone(&inner.handlers),
            Arc::clone(&inner.notifications),
            Arc::downgrade(&self.inner),
        );

        let request = InitializeRequest {
            protocol_version: inner.config.protocol_version.clone(),
            capabilities: inner.capabilities.local().clone(),
            client_info: inner.config.client_info.clone(),
        };
        debug!(
            "Sending initialize (protocol {}, client {})",
            request.protocol_version, request.client_info.name
        );
        let value = inner
            .protocol
            .request(
                methods::INITIALIZE,
                Some(to_params(&request)?),
                timeout,
            )
            .await?;
        let result: InitializeResult = from_result(methods::INITIALIZE, value)?;

        if !is_supported_protocol_version(&result.protocol_version) {
            return Err(McpError::protocol_version(
                &result.protocol_version,
                SUPPORTED_PROTOCOL_VERSIONS,
            ));
        }

        inner.capabilities.record(result.clone());
        inner.protocol.notify(methods::INITIALIZED, None).await?;
        Ok(result)
    }

    async fn ensure_ready(&self) -> McpResult<()> {
        match self.state() {
            SessionState::Ready => Ok(()),
            SessionState::Closed => Err(McpError::session_closed("Session is closed")),
            SessionState::Uninitialized | SessionState::Initializing => {
                self.initialize().await.map(|_| ())
            }
        }
    }

    /// Close the session now.
    ///
    /// Pending requests fail with `SessionClosed` immediately, the receive
    /// loop stops and the transport is disconnected. Calling it again does
    /// nothing.
    pub async fn close(&self) {
        let protocol = &self.inner.protocol;
        if protocol.lifecycle().close() {
            info!("Closing session");
        }
        protocol
            .terminate(McpError::session_closed("Session closed"))
            .await;
    }

    /// Close the session once in-flight requests have finished.
    ///
    /// New calls are rejected right away. Requests already sent get up to the
    /// graceful shutdown timeout to complete; whatever is still pending then
    /// fails with `SessionClosed`.
    pub async fn close_gracefully(&self) {
        let protocol = &self.inner.protocol;
        if protocol.lifecycle().close() {
            info!("Closing session gracefully");
        }

        let in_flight = protocol.pending().len();
        if in_flight > 0 {
            let grace = self.inner.config.graceful_shutdown_timeout();
            debug!(
                "Waiting up to {:?} for {} in-flight request(s)",
                grace, in_flight
            );
            if tokio::time::timeout(grace, protocol.pending().wait_until_empty())
                .await
                .is_err()
            {
                warn!(
                    "Graceful shutdown timed out with {} request(s) still pending",
                    protocol.pending().len()
                );
            }
        }

        protocol
            .terminate(McpError::session_closed("Session closed"))
            .await;
    }

    // ============================================================================
    // SEND PRIMITIVES
    // ============================================================================

    /// Send a request and wait for its result.
    ///
    /// `timeout` defaults to the configured request timeout. Runs the
    /// handshake first if the session is not initialized yet.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty method or a zero timeout;
    /// `Rpc` with the server's code, message and data when it answers with an
    /// error; `Timeout` when no answer arrives in time; `SessionClosed` when
    /// the session is or becomes closed.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> McpResult<Value> {
        if method.is_empty() {
            return Err(McpError::invalid_argument("Method must not be empty"));
        }
        let timeout = timeout.unwrap_or_else(|| self.inner.config.request_timeout());
        if timeout.is_zero() {
            return Err(McpError::invalid_argument(
                "Request timeout must be greater than zero",
            ));
        }
        self.ensure_ready().await?;
        self.inner.protocol.request(method, params, timeout).await
    }

    /// Send a notification. Runs the handshake first if needed.
    ///
    /// # Errors
    ///
    /// `SessionClosed` after close, `Transport` if the write fails.
    pub async fn send_notification(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.ensure_ready().await?;
        self.inner.protocol.notify(method, params).await
    }

    /// Typed request with the default timeout
    pub(crate) async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> McpResult<R> {
        let value = self.send_request(method, params, None).await?;
        from_result(method, value)
    }

    // ============================================================================
    // ROOTS
    // ============================================================================

    /// Add a root and tell the server the list changed.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty or duplicate uri, or whatever sending
    /// the change notification fails with (the root stays added).
    pub async fn add_root(&self, root: Root) -> McpResult<()> {
        self.inner
            .roots
            .add_with(root, || self.notify_roots_changed())
            .await
    }

    /// Remove the root with `uri` and tell the server the list changed.
    ///
    /// # Errors
    ///
    /// `NotFound` if no root has that uri.
    pub async fn remove_root(&self, uri: &str) -> McpResult<Root> {
        self.inner
            .roots
            .remove_with(uri, || self.notify_roots_changed())
            .await
    }

    /// Current roots, in insertion order
    pub async fn list_roots(&self) -> Vec<Root> {
        self.inner.roots.list().await
    }

    async fn notify_roots_changed(&self) -> McpResult<()> {
        if !self.inner.capabilities.declares_roots() {
            return Ok(());
        }
        if self.is_closed() {
            debug!("Session closed, not announcing roots change");
            return Ok(());
        }
        self.send_notification(methods::ROOTS_LIST_CHANGED, None)
            .await
    }

    // ============================================================================
    // HANDLERS AND CONSUMERS
    // ============================================================================

    /// Answer server requests for `method` with `handler`.
    ///
    /// Returns the handler it replaced, if any.
    pub fn register_handler<H>(
        &self,
        method: impl Into<String>,
        handler: H,
    ) -> Option<Arc<dyn RequestHandler>>
    where
        H: RequestHandler + 'static,
    {
        self.inner.handlers.register(method, handler)
    }

    /// Stop answering server requests for `method`
    pub fn unregister_handler(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.inner.handlers.unregister(method)
    }

    /// Receive the full tool list whenever the server reports a change
    pub fn on_tools_changed<C>(&self, consumer: C)
    where
        C: NotificationConsumer<Vec<Tool>> + 'static,
    {
        self.inner.notifications.tools_changed().subscribe(Arc::new(consumer));
    }

    /// Receive the full resource list whenever the server reports a change
    pub fn on_resources_changed<C>(&self, consumer: C)
    where
        C: NotificationConsumer<Vec<Resource>> + 'static,
    {
        self.inner
            .notifications
            .resources_changed()
            .subscribe(Arc::new(consumer));
    }

    /// Receive the full prompt list whenever the server reports a change
    pub fn on_prompts_changed<C>(&self, consumer: C)
    where
        C: NotificationConsumer<Vec<Prompt>> + 'static,
    {
        self.inner
            .notifications
            .prompts_changed()
            .subscribe(Arc::new(consumer));
    }

    /// Receive server log messages
    pub fn on_logging_message<C>(&self, consumer: C)
    where
        C: NotificationConsumer<LoggingMessageNotification> + 'static,
    {
        self.inner.notifications.logging().subscribe(Arc::new(consumer));
    }

    /// Receive progress notifications
    pub fn on_progress<C>(&self, consumer: C)
    where
        C: NotificationConsumer<ProgressNotification> + 'static,
    {
        self.inner.notifications.progress().subscribe(Arc::new(consumer));
    }

    /// Receive updates for subscribed resources
    pub fn on_resource_updated<C>(&self, consumer: C)
    where
        C: NotificationConsumer<ResourceUpdatedNotification> + 'static,
    {
        self.inner
            .notifications
            .resource_updated()
            .subscribe(Arc::new(consumer));
    }

    // ============================================================================
    // STATE
    // ============================================================================

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.protocol.lifecycle().state()
    }

    /// Whether the handshake completed and the session is open
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Whether the session is closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.protocol.lifecycle().is_closed()
    }

    /// Number of requests waiting for a response
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.protocol.pending().len()
    }

    /// Settings the session was built with
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Capabilities declared to the server
    #[must_use]
    pub fn client_capabilities(&self) -> &ClientCapabilities {
        self.inner.capabilities.local()
    }

    /// Capabilities the server declared, once initialized
    #[must_use]
    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.inner.capabilities.server_capabilities()
    }

    /// Server name and version, once initialized
    #[must_use]
    pub fn server_info(&self) -> Option<&Implementation> {
        self.inner.capabilities.server_info()
    }

    /// Negotiated protocol version, once initialized
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.inner.capabilities.protocol_version()
    }

    /// Usage instructions the server sent, if any
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.inner.capabilities.instructions()
    }

    /// Whether the server declared tools
    #[must_use]
    pub fn server_supports_tools(&self) -> bool {
        self.inner.capabilities.server_supports_tools()
    }

    /// Whether the server declared resources
    #[must_use]
    pub fn server_supports_resources(&self) -> bool {
        self.inner.capabilities.server_supports_resources()
    }

    /// Whether the server accepts resource subscriptions
    #[must_use]
    pub fn server_supports_resource_subscriptions(&self) -> bool {
        self.inner
            .capabilities
            .server_supports_resource_subscriptions()
    }

    /// Whether the server declared prompts
    #[must_use]
    pub fn server_supports_prompts(&self) -> bool {
        self.inner.capabilities.server_supports_prompts()
    }

    /// Whether the server declared logging
    #[must_use]
    pub fn server_supports_logging(&self) -> bool {
        self.inner.capabilities.server_supports_logging()
    }

    /// Whether the server declared argument completion
    #[must_use]
    pub fn server_supports_completions(&self) -> bool {
        self.inner.capabilities.server_supports_completions()
    }
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("protocol", &self.inner.protocol)
            .field("handlers", &self.inner.handlers)
            .finish_non_exhaustive()
    }
}

pub(crate) fn to_params<P: Serialize>(params: &P) -> McpResult<Value> {
    serde_json::to_value(params)
        .map_err(|e| McpError::serialization(format!("Failed to serialize params: {e}")))
}

pub(crate) fn from_result<R: DeserializeOwned>(method: &str, value: Value) -> McpResult<R> {
    serde_json::from_value(value).map_err(|e| {
        McpError::serialization(format!("Invalid {method} result: {e}")).with_operation(method)
    })
}
