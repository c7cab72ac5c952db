//! Handlers for server-initiated requests.
//!
//! MCP is bidirectional: besides answering the client, a server can send
//! requests of its own (`ping`, `roots/list`, `sampling/createMessage`,
//! `elicitation/create`, ...). Each method maps to at most one
//! [`RequestHandler`] in the session's [`RequestHandlerTable`]. The receive
//! loop hands every inbound request to [`RequestHandlerTable::dispatch`] on its
//! own task and writes the returned response back with the request's id.
//!
//! ## Usage
//!
//! ```rust
//! use mcp_session::handlers::{HandlerError, RequestHandlerTable};
//! use mcp_session_protocol::JsonRpcRequest;
//! use serde_json::{Value, json};
//!
//! # tokio_test::block_on(async {
//! let table = RequestHandlerTable::new();
//! table.register("custom/echo", |params: Option<Value>| async move {
//!     Ok::<_, HandlerError>(params.unwrap_or(Value::Null))
//! });
//!
//! let response = table
//!     .dispatch(JsonRpcRequest::new("custom/echo", Some(json!({"a": 1})), 7))
//!     .await;
//! assert_eq!(response.result(), Some(&json!({"a": 1})));
//! # });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use mcp_session_protocol::types::{
    CreateMessageRequest, CreateMessageResult, ElicitRequest, ElicitResult, ListRootsResult,
};
use mcp_session_protocol::{ErrorKind, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpError};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::roots::RootRegistry;

// ============================================================================
// ERROR TYPES FOR HANDLER OPERATIONS
// ============================================================================

/// Errors a handler or notification consumer can report
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The user declined the request
    #[error("User cancelled the operation")]
    UserCancelled,

    /// Handler operation timed out
    #[error("Handler operation timed out after {timeout_seconds} seconds")]
    Timeout {
        /// Elapsed budget
        timeout_seconds: u64,
    },

    /// Request parameters could not be used
    #[error("Invalid input: {details}")]
    InvalidInput {
        /// What was wrong
        details: String,
    },

    /// Handler configuration error
    #[error("Handler configuration error: {message}")]
    Configuration {
        /// What is misconfigured
        message: String,
    },

    /// Generic handler error
    #[error("Handler error: {message}")]
    Generic {
        /// Description
        message: String,
    },

    /// A session call made from inside a handler failed
    #[error("Session error: {0}")]
    Session(#[from] McpError),

    /// External system error (UI framework, model provider, ...)
    #[error("External system error: {source}")]
    External {
        /// Underlying error
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HandlerError {
    /// Convert handler error to the JSON-RPC error sent back to the server
    ///
    /// # Error Code Mapping
    ///
    /// - **-1**: User rejected the request
    /// - **-32801**: Handler operation timed out
    /// - **-32602**: Invalid input
    /// - **-32601**: Handler configuration error
    /// - **-32603**: Generic or external handler error
    /// - session errors keep their own code
    ///
    /// ```rust
    /// use mcp_session::handlers::HandlerError;
    ///
    /// let error = HandlerError::UserCancelled;
    /// let jsonrpc_error = error.into_jsonrpc_error();
    /// assert_eq!(jsonrpc_error.code, -1);
    /// ```
    #[must_use]
    pub fn into_jsonrpc_error(&self) -> JsonRpcError {
        let code = match self {
            HandlerError::UserCancelled => -1,
            HandlerError::Timeout { .. } => -32801,
            HandlerError::InvalidInput { .. } => -32602,
            HandlerError::Configuration { .. } => -32601,
            HandlerError::Generic { .. } | HandlerError::External { .. } => -32603,
            HandlerError::Session(err) => err.jsonrpc_code(),
        };
        let message = match self {
            HandlerError::UserCancelled => "User rejected the request".to_string(),
            other => other.to_string(),
        };
        JsonRpcError::new(code, message)
    }
}

/// Result type for handlers and notification consumers
pub type HandlerResult<T> = Result<T, HandlerError>;

// ============================================================================
// REQUEST HANDLER TRAIT AND TABLE
// ============================================================================

/// Answers one server-initiated method
///
/// Implemented for any `Fn(Option<Value>) -> impl Future<Output = HandlerResult<Value>>`.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Produce the `result` for a request with these `params`
    async fn handle(&self, params: Option<Value>) -> HandlerResult<Value>;
}

#[async_trait]
impl<F, Fut> RequestHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<Value>> + Send,
{
    async fn handle(&self, params: Option<Value>) -> HandlerResult<Value> {
        (self)(params).await
    }
}

/// Method name to handler map
///
/// At most one handler per method; registering again replaces the previous
/// handler.
#[derive(Default)]
pub struct RequestHandlerTable {
    handlers: RwLock<HashMap<String, Arc<dyn RequestHandler>>>,
}

impl RequestHandlerTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method`, returning the handler it replaced.
    pub fn register<H>(
        &self,
        method: impl Into<String>,
        handler: H,
    ) -> Option<Arc<dyn RequestHandler>>
    where
        H: RequestHandler + 'static,
    {
        self.register_arc(method, Arc::new(handler))
    }

    /// Register an already shared handler
    pub fn register_arc(
        &self,
        method: impl Into<String>,
        handler: Arc<dyn RequestHandler>,
    ) -> Option<Arc<dyn RequestHandler>> {
        let method = method.into();
        debug!("Registering request handler for {}", method);
        let previous = self.handlers.write().insert(method.clone(), handler);
        if previous.is_some() {
            debug!("Replaced existing handler for {}", method);
        }
        previous
    }

    /// Remove the handler for `method`
    pub fn unregister(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.handlers.write().remove(method)
    }

    /// Handler registered for `method`
    #[must_use]
    pub fn get(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.handlers.read().get(method).cloned()
    }

    /// Whether `method` has a handler
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.read().contains_key(method)
    }

    /// Registered method names, sorted
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.read().keys().cloned().collect();
        methods.sort();
        methods
    }

    /// Run the handler for `request` and build the response to send back.
    ///
    /// Never fails: an unknown method becomes `-32601`, a handler error its
    /// own code, and a handler panic `-32603`.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            method, params, id, ..
        } = request;

        let Some(handler) = self.get(&method) else {
            warn!("No handler registered for server request {}", method);
            return JsonRpcResponse::error_response(JsonRpcError::method_not_found(&method), id);
        };

        debug!("Handling server request {} ({})", method, id);
        match AssertUnwindSafe(handler.handle(params)).catch_unwind().await {
            Ok(Ok(result)) => JsonRpcResponse::success(result, id),
            Ok(Err(e)) => {
                warn!("Handler for {} failed: {}", method, e);
                JsonRpcResponse::error_response(e.into_jsonrpc_error(), id)
            }
            Err(panic) => {
                let reason = panic_message(&*panic);
                error!("Handler for {} panicked: {}", method, reason);
                JsonRpcResponse::error_response(
                    JsonRpcError::internal_error(&format!("Handler panicked: {reason}")),
                    id,
                )
            }
        }
    }
}

impl std::fmt::Debug for RequestHandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandlerTable")
            .field("methods", &self.methods())
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> HandlerResult<T> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| {
        HandlerError::InvalidInput {
            details: e.to_string(),
        }
    })
}

fn to_result<T: Serialize>(value: &T) -> HandlerResult<Value> {
    serde_json::to_value(value).map_err(|e| HandlerError::Generic {
        message: format!("Failed to serialize handler result: {e}"),
    })
}

// ============================================================================
// TYPED HANDLERS
// ============================================================================

/// Handler for `sampling/createMessage`
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use mcp_session::handlers::{HandlerResult, SamplingHandler};
/// use mcp_session_protocol::types::{ContentBlock, CreateMessageRequest, CreateMessageResult, Role};
///
/// #[derive(Debug)]
/// struct Canned;
///
/// #[async_trait]
/// impl SamplingHandler for Canned {
///     async fn handle_create_message(
///         &self,
///         _request: CreateMessageRequest,
///     ) -> HandlerResult<CreateMessageResult> {
///         Ok(CreateMessageResult {
///             role: Role::Assistant,
///             content: ContentBlock::text("hello"),
///             model: "canned".to_string(),
///             stop_reason: None,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait SamplingHandler: Send + Sync + std::fmt::Debug {
    /// Generate a message for the server
    async fn handle_create_message(
        &self,
        request: CreateMessageRequest,
    ) -> HandlerResult<CreateMessageResult>;
}

/// Handler for `elicitation/create`
#[async_trait]
pub trait ElicitationHandler: Send + Sync + std::fmt::Debug {
    /// Ask the user for the requested input
    async fn handle_elicitation(&self, request: ElicitRequest) -> HandlerResult<ElicitResult>;
}

/// Adapts a [`SamplingHandler`] to the untyped table
#[derive(Debug)]
pub(crate) struct SamplingAdapter(pub(crate) Arc<dyn SamplingHandler>);

#[async_trait]
impl RequestHandler for SamplingAdapter {
    async fn handle(&self, params: Option<Value>) -> HandlerResult<Value> {
        let request: CreateMessageRequest = parse_params(params)?;
        let result = self.0.handle_create_message(request).await?;
        to_result(&result)
    }
}

/// Adapts an [`ElicitationHandler`] to the untyped table
#[derive(Debug)]
pub(crate) struct ElicitationAdapter(pub(crate) Arc<dyn ElicitationHandler>);

#[async_trait]
impl RequestHandler for ElicitationAdapter {
    async fn handle(&self, params: Option<Value>) -> HandlerResult<Value> {
        let request: ElicitRequest = parse_params(params)?;
        let result = self.0.handle_elicitation(request).await?;
        to_result(&result)
    }
}

/// Built-in `ping` handler
#[derive(Debug)]
pub(crate) struct PingHandler;

#[async_trait]
impl RequestHandler for PingHandler {
    async fn handle(&self, _params: Option<Value>) -> HandlerResult<Value> {
        Ok(Value::Object(serde_json::Map::new()))
    }
}

/// Built-in `roots/list` handler answering from the session's registry
#[derive(Debug)]
pub(crate) struct RootsListHandler {
    pub(crate) roots: Arc<RootRegistry>,
}

#[async_trait]
impl RequestHandler for RootsListHandler {
    async fn handle(&self, _params: Option<Value>) -> HandlerResult<Value> {
        to_result(&ListRootsResult {
            roots: self.roots.list().await,
            _meta: None,
        })
    }
}

impl From<HandlerError> for McpError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Session(inner) => inner,
            HandlerError::InvalidInput { .. } => {
                McpError::new(ErrorKind::InvalidArgument, err.to_string())
            }
            other => McpError::internal(other.to_string()),
        }
    }
}
