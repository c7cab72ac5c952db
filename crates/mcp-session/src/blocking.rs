//! Blocking facade over [`McpSession`].
//!
//! [`BlockingSession`] owns a multi-thread Tokio runtime. The receive loop
//! runs on the runtime's workers, so the calling thread can block on a
//! response without ever being the thread that has to deliver it.
//!
//! Do not use it from inside an async context; every method returns an
//! `Internal` error there instead of blocking a runtime worker.
//!
//! ```rust,no_run
//! use mcp_session::McpSession;
//! use mcp_session::blocking::BlockingSession;
//! use mcp_session_transport::ChannelTransport;
//!
//! # fn example() -> mcp_session_protocol::McpResult<()> {
//! let (client_end, _server_end) = ChannelTransport::pair();
//! let session = BlockingSession::new(McpSession::builder().with_transport(client_end))?;
//! for tool in session.list_all_tools()? {
//!     println!("{}", tool.name);
//! }
//! session.close();
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use mcp_session_protocol::types::{
    CallToolRequest, CallToolResult, CompleteResult, CompletionArgument, CompletionReference,
    Cursor, GetPromptResult, InitializeResult, LoggingLevel, Prompt, ReadResourceResult, Resource,
    ResourceTemplate, Root, Tool,
};
use mcp_session_protocol::{McpError, McpResult};
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::pagination::Page;
use crate::session::{McpSession, SessionBuilder, SessionState};

/// Synchronous handle to an MCP session
#[derive(Debug)]
pub struct BlockingSession {
    // Field order: the session drops before its runtime.
    session: McpSession,
    runtime: Runtime,
}

impl BlockingSession {
    /// Build the session from `builder` on a fresh runtime
    ///
    /// # Errors
    ///
    /// `Internal` if the runtime cannot be created, or the builder's own
    /// validation errors.
    pub fn new(builder: SessionBuilder) -> McpResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mcp-session")
            .enable_all()
            .build()
            .map_err(|e| McpError::internal(format!("Failed to start async runtime: {e}")))?;
        let session = builder.build()?;
        Ok(Self { session, runtime })
    }

    /// The async session behind this facade
    #[must_use]
    pub fn session(&self) -> &McpSession {
        &self.session
    }

    fn run<T>(&self, future: impl Future<Output = McpResult<T>>) -> McpResult<T> {
        if Handle::try_current().is_ok() {
            return Err(McpError::internal(
                "BlockingSession cannot be used from within an async runtime",
            ));
        }
        self.runtime.block_on(future)
    }

    /// See [`McpSession::initialize`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn initialize(&self) -> McpResult<InitializeResult> {
        self.run(self.session.initialize())
    }

    /// See [`McpSession::send_request`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn send_request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> McpResult<Value> {
        self.run(self.session.send_request(method, params, timeout))
    }

    /// See [`McpSession::send_notification`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn send_notification(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.run(self.session.send_notification(method, params))
    }

    /// See [`McpSession::ping`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn ping(&self) -> McpResult<()> {
        self.run(self.session.ping())
    }

    /// See [`McpSession::list_tools`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_tools(&self, cursor: Option<Cursor>) -> McpResult<Page<Tool>> {
        self.run(self.session.list_tools(cursor))
    }

    /// See [`McpSession::list_all_tools`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_all_tools(&self) -> McpResult<Vec<Tool>> {
        self.run(self.session.list_all_tools())
    }

    /// See [`McpSession::call_tool`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> McpResult<CallToolResult> {
        self.run(self.session.call_tool(name, arguments))
    }

    /// See [`McpSession::call_tool_with`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn call_tool_with(&self, request: CallToolRequest) -> McpResult<CallToolResult> {
        self.run(self.session.call_tool_with(request))
    }

    /// See [`McpSession::list_resources`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_resources(&self, cursor: Option<Cursor>) -> McpResult<Page<Resource>> {
        self.run(self.session.list_resources(cursor))
    }

    /// See [`McpSession::list_all_resources`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_all_resources(&self) -> McpResult<Vec<Resource>> {
        self.run(self.session.list_all_resources())
    }

    /// See [`McpSession::read_resource`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        self.run(self.session.read_resource(uri))
    }

    /// See [`McpSession::list_all_resource_templates`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_all_resource_templates(&self) -> McpResult<Vec<ResourceTemplate>> {
        self.run(self.session.list_all_resource_templates())
    }

    /// See [`McpSession::subscribe_resource`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn subscribe_resource(&self, uri: &str) -> McpResult<()> {
        self.run(self.session.subscribe_resource(uri))
    }

    /// See [`McpSession::unsubscribe_resource`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn unsubscribe_resource(&self, uri: &str) -> McpResult<()> {
        self.run(self.session.unsubscribe_resource(uri))
    }

    /// See [`McpSession::list_all_prompts`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn list_all_prompts(&self) -> McpResult<Vec<Prompt>> {
        self.run(self.session.list_all_prompts())
    }

    /// See [`McpSession::get_prompt`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> McpResult<GetPromptResult> {
        self.run(self.session.get_prompt(name, arguments))
    }

    /// See [`McpSession::complete`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn complete(
        &self,
        reference: CompletionReference,
        argument: CompletionArgument,
    ) -> McpResult<CompleteResult> {
        self.run(self.session.complete(reference, argument))
    }

    /// See [`McpSession::set_logging_level`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn set_logging_level(&self, level: LoggingLevel) -> McpResult<()> {
        self.run(self.session.set_logging_level(level))
    }

    /// See [`McpSession::set_logging_level_str`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn set_logging_level_str(&self, level: &str) -> McpResult<()> {
        self.run(self.session.set_logging_level_str(level))
    }

    /// See [`McpSession::add_root`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn add_root(&self, root: Root) -> McpResult<()> {
        self.run(self.session.add_root(root))
    }

    /// See [`McpSession::remove_root`]
    ///
    /// # Errors
    ///
    /// As for the async call.
    pub fn remove_root(&self, uri: &str) -> McpResult<Root> {
        self.run(self.session.remove_root(uri))
    }

    /// See [`McpSession::list_roots`]
    ///
    /// # Errors
    ///
    /// `Internal` when called from inside an async runtime.
    pub fn list_roots(&self) -> McpResult<Vec<Root>> {
        self.run(async { Ok(self.session.list_roots().await) })
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// See [`McpSession::close`]. Does nothing inside an async runtime.
    pub fn close(&self) {
        if let Err(e) = self.run(async {
            self.session.close().await;
            Ok(())
        }) {
            tracing::warn!("Blocking close skipped: {}", e);
        }
    }

    /// See [`McpSession::close_gracefully`]. Does nothing inside an async runtime.
    pub fn close_gracefully(&self) {
        if let Err(e) = self.run(async {
            self.session.close_gracefully().await;
            Ok(())
        }) {
            tracing::warn!("Blocking graceful close skipped: {}", e);
        }
    }
}

impl Drop for BlockingSession {
    fn drop(&mut self) {
        if !self.session.is_closed() && Handle::try_current().is_err() {
            self.runtime.block_on(self.session.close());
        }
    }
}
