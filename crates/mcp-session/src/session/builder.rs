//! Session builder.
//!
//! Collects the transport, configuration, initial roots, reverse-request
//! handlers and notification consumers, then validates everything in
//! [`SessionBuilder::build`].

use std::sync::Arc;
use std::time::Duration;

use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    ClientCapabilities, ElicitationCapabilities, Implementation, LoggingMessageNotification,
    ProgressNotification, Prompt, Resource, ResourceUpdatedNotification, Root, RootsCapabilities,
    SamplingCapabilities, Tool,
};
use mcp_session_protocol::{McpError, McpResult};
use mcp_session_transport::Transport;

use super::config::SessionConfig;
use super::core::McpSession;
use crate::handlers::{
    ElicitationAdapter, ElicitationHandler, PingHandler, RequestHandler, RequestHandlerTable,
    RootsListHandler, SamplingAdapter, SamplingHandler,
};
use crate::notifications::{NotificationConsumer, NotificationDispatcher};
use crate::roots::RootRegistry;

/// Builder for [`McpSession`]
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use mcp_session::McpSession;
/// use mcp_session::handlers::HandlerError;
/// use mcp_session_protocol::types::{LoggingMessageNotification, Root};
/// use mcp_session_transport::ChannelTransport;
///
/// # fn example() -> mcp_session_protocol::McpResult<()> {
/// let (client_end, _server_end) = ChannelTransport::pair();
/// let session = McpSession::builder()
///     .with_transport(client_end)
///     .with_request_timeout(Duration::from_secs(30))
///     .with_root(Root::new("file:///workspace", Some("workspace".to_string())))
///     .on_logging_message(|message: LoggingMessageNotification| async move {
///         println!("[{:?}] {}", message.level, message.data);
///         Ok::<_, HandlerError>(())
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: SessionConfig,
    roots: Vec<Root>,
    handlers: Vec<(String, Arc<dyn RequestHandler>)>,
    sampling_handler: Option<Arc<dyn SamplingHandler>>,
    elicitation_handler: Option<Arc<dyn ElicitationHandler>>,
    notifications: NotificationDispatcher,
}

impl SessionBuilder {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // TRANSPORT AND CONFIGURATION
    // ============================================================================

    /// Use `transport` for this session
    #[must_use]
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a transport that is shared with other owners
    #[must_use]
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default timeout for requests
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = duration_ms(timeout);
        self
    }

    /// Timeout for the handshake
    #[must_use]
    pub fn with_initialization_timeout(mut self, timeout: Duration) -> Self {
        self.config.initialization_timeout_ms = duration_ms(timeout);
        self
    }

    /// How long `close_gracefully` waits for in-flight requests
    #[must_use]
    pub fn with_graceful_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.graceful_shutdown_timeout_ms = duration_ms(timeout);
        self
    }

    /// Name and version sent to the server
    #[must_use]
    pub fn with_client_info(mut self, client_info: Implementation) -> Self {
        self.config.client_info = client_info;
        self
    }

    /// Protocol version offered in `initialize`
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.config.protocol_version = version.into();
        self
    }

    /// Capabilities declared to the server
    ///
    /// Capabilities implied by configured roots and typed handlers are added
    /// on top at build time.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Declare roots support, optionally with change notifications
    #[must_use]
    pub fn with_roots_capability(mut self, list_changed: bool) -> Self {
        self.config.capabilities.roots = Some(RootsCapabilities {
            list_changed: Some(list_changed),
        });
        self
    }

    // ============================================================================
    // ROOTS
    // ============================================================================

    /// Add an initial root
    #[must_use]
    pub fn with_root(mut self, root: Root) -> Self {
        self.roots.push(root);
        self
    }

    /// Add several initial roots
    #[must_use]
    pub fn with_roots(mut self, roots: impl IntoIterator<Item = Root>) -> Self {
        self.roots.extend(roots);
        self
    }

    // ============================================================================
    // REVERSE-REQUEST HANDLERS
    // ============================================================================

    /// Answer server requests for `method` with `handler`
    ///
    /// A later registration for the same method wins.
    #[must_use]
    pub fn with_request_handler<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: RequestHandler + 'static,
    {
        self.handlers.push((method.into(), Arc::new(handler)));
        self
    }

    /// Answer `sampling/createMessage` and declare sampling support
    #[must_use]
    pub fn with_sampling_handler(mut self, handler: Arc<dyn SamplingHandler>) -> Self {
        self.sampling_handler = Some(handler);
        self
    }

    /// Answer `elicitation/create` and declare elicitation support
    #[must_use]
    pub fn with_elicitation_handler(mut self, handler: Arc<dyn ElicitationHandler>) -> Self {
        self.elicitation_handler = Some(handler);
        self
    }

    // ============================================================================
    // NOTIFICATION CONSUMERS
    // ============================================================================

    /// Receive the full tool list after every `tools/list_changed`
    #[must_use]
    pub fn on_tools_changed<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<Vec<Tool>> + 'static,
    {
        self.notifications.tools_changed().subscribe(Arc::new(consumer));
        self
    }

    /// Receive the full resource list after every `resources/list_changed`
    #[must_use]
    pub fn on_resources_changed<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<Vec<Resource>> + 'static,
    {
        self.notifications
            .resources_changed()
            .subscribe(Arc::new(consumer));
        self
    }

    /// Receive the full prompt list after every `prompts/list_changed`
    #[must_use]
    pub fn on_prompts_changed<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<Vec<Prompt>> + 'static,
    {
        self.notifications
            .prompts_changed()
            .subscribe(Arc::new(consumer));
        self
    }

    /// Receive server log messages
    #[must_use]
    pub fn on_logging_message<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<LoggingMessageNotification> + 'static,
    {
        self.notifications.logging().subscribe(Arc::new(consumer));
        self
    }

    /// Receive progress notifications
    #[must_use]
    pub fn on_progress<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<ProgressNotification> + 'static,
    {
        self.notifications.progress().subscribe(Arc::new(consumer));
        self
    }

    /// Receive updates for subscribed resources
    #[must_use]
    pub fn on_resource_updated<C>(self, consumer: C) -> Self
    where
        C: NotificationConsumer<ResourceUpdatedNotification> + 'static,
    {
        self.notifications
            .resource_updated()
            .subscribe(Arc::new(consumer));
        self
    }

    // ============================================================================
    // BUILD
    // ============================================================================

    /// Validate the configuration and create the session.
    ///
    /// Nothing is sent yet; the first operation (or an explicit
    /// [`McpSession::initialize`]) connects and performs the handshake.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no transport was given, a timeout is zero, or
    /// an initial root is empty or duplicated.
    pub fn build(self) -> McpResult<McpSession> {
        let Self {
            transport,
            mut config,
            roots,
            handlers,
            sampling_handler,
            elicitation_handler,
            notifications,
        } = self;

        let transport =
            transport.ok_or_else(|| McpError::invalid_argument("Transport must not be null"))?;
        config.validate()?;

        if !roots.is_empty() && config.capabilities.roots.is_none() {
            config.capabilities.roots = Some(RootsCapabilities {
                list_changed: Some(true),
            });
        }
        if sampling_handler.is_some() && config.capabilities.sampling.is_none() {
            config.capabilities.sampling = Some(SamplingCapabilities {});
        }
        if elicitation_handler.is_some() && config.capabilities.elicitation.is_none() {
            config.capabilities.elicitation = Some(ElicitationCapabilities {});
        }

        let roots = Arc::new(RootRegistry::with_roots(roots)?);

        let table = RequestHandlerTable::new();
        table.register(methods::PING, PingHandler);
        if config.capabilities.roots.is_some() {
            table.register(
                methods::ROOTS_LIST,
                RootsListHandler {
                    roots: Arc::clone(&roots),
                },
            );
        }
        if let Some(handler) = sampling_handler {
            table.register(methods::SAMPLING_CREATE_MESSAGE, SamplingAdapter(handler));
        }
        if let Some(handler) = elicitation_handler {
            table.register(methods::ELICITATION_CREATE, ElicitationAdapter(handler));
        }
        for (method, handler) in handlers {
            table.register_arc(method, handler);
        }

        tracing::debug!(
            "Building session: {} handler(s), request timeout {:?}",
            table.methods().len(),
            config.request_timeout()
        );

        Ok(McpSession::from_parts(
            transport,
            config,
            Arc::new(table),
            Arc::new(notifications),
            roots,
        ))
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .field("roots", &self.roots)
            .field(
                "handlers",
                &self.handlers.iter().map(|(m, _)| m).collect::<Vec<_>>(),
            )
            .field("sampling_handler", &self.sampling_handler)
            .field("elicitation_handler", &self.elicitation_handler)
            .field("notifications", &self.notifications)
            .finish()
    }
}

/// Whole milliseconds, rounding any non-zero remainder up.
fn duration_ms(timeout: Duration) -> u64 {
    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if timeout.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis.saturating_add(1)
    }
}
