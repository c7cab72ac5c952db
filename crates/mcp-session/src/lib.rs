//! # MCP Session
//!
//! Client-side session engine for the Model Context Protocol: everything
//! between "I have a duplex message transport" and "I can call tools".
//!
//! ## Features
//!
//! - Handshake and capability negotiation, run implicitly on first use
//! - Request/response correlation under concurrency with per-request deadlines
//! - Ordered notification fan-out to any number of typed consumers
//! - Answers to server-initiated requests (`ping`, `roots/list`, sampling,
//!   elicitation, or any method you register)
//! - Client-owned root registry that announces its changes
//! - Cursor pagination helpers
//! - A blocking facade for synchronous callers
//!
//! ## Architecture
//!
//! ```text
//! Application
//!        ↓
//! McpSession (this crate)      ← handlers, consumers, roots
//!        ↓
//! JSON-RPC envelopes (mcp-session-protocol)
//!        ↓
//! Transport (mcp-session-transport)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mcp_session::McpSession;
//! use mcp_session_transport::ChannelTransport;
//!
//! # async fn example() -> mcp_session_protocol::McpResult<()> {
//! let (client_end, _server_end) = ChannelTransport::pair();
//! let session = McpSession::builder().with_transport(client_end).build()?;
//!
//! let result = session.initialize().await?;
//! println!("Connected to: {}", result.server_info.name);
//!
//! for tool in session.list_all_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! session.close_gracefully().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`McpResult`]. The error's [`ErrorKind`] tells a
//! peer error (`Rpc`, with the server's code) from a timeout, a closed
//! session or a bad argument:
//!
//! ```rust,no_run
//! # use mcp_session::McpSession;
//! # use mcp_session_protocol::ErrorKind;
//! # async fn example(session: McpSession) {
//! match session.call_tool("my_tool", None).await {
//!     Ok(result) => println!("Tool result: {:?}", result),
//!     Err(e) if e.kind == ErrorKind::Timeout => eprintln!("Tool timed out"),
//!     Err(e) => eprintln!("Tool call failed: {}", e),
//! }
//! # }
//! ```

pub mod blocking;
pub(crate) mod capabilities;
pub mod handlers;
pub mod notifications;
pub mod pagination;
pub mod prelude;
pub mod roots;
pub mod session;

pub use blocking::BlockingSession;
pub use handlers::{
    ElicitationHandler, HandlerError, HandlerResult, RequestHandler, RequestHandlerTable,
    SamplingHandler,
};
pub use notifications::{ConsumerList, ListSource, NotificationConsumer, NotificationDispatcher};
pub use pagination::{Page, list_all, pages};
pub use roots::RootRegistry;
pub use session::{McpSession, SessionBuilder, SessionConfig, SessionState};

pub use mcp_session_protocol::{ErrorKind, McpError, McpResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
