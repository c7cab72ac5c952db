//! Prelude module for convenient imports
//!
//! ```rust,no_run
//! use mcp_session::prelude::*;
//!
//! # async fn example() -> McpResult<()> {
//! let (client_end, _server_end) = ChannelTransport::pair();
//! let session = McpSession::builder().with_transport(client_end).build()?;
//! let tools = session.list_all_tools().await?;
//! println!("Found {} tools", tools.len());
//! # Ok(())
//! # }
//! ```

pub use crate::{CRATE_NAME, VERSION};

pub use crate::{
    BlockingSession, ElicitationHandler, ErrorKind, HandlerError, HandlerResult, McpError,
    McpResult, McpSession, NotificationConsumer, Page, RequestHandler, SamplingHandler,
    SessionBuilder, SessionConfig, SessionState,
};

pub use mcp_session_protocol::types::{
    CallToolRequest, CallToolResult, ClientCapabilities, ContentBlock, Implementation,
    InitializeResult, LoggingLevel, LoggingMessageNotification, ProgressNotification, Prompt,
    Resource, ResourceUpdatedNotification, Root, ServerCapabilities, Tool,
};

pub use mcp_session_transport::{ChannelTransport, Transport};
