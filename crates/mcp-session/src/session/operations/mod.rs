//! Typed MCP operations
//!
//! Every operation goes through [`McpSession::send_request`] or
//! [`McpSession::send_notification`], so each one initializes the session on
//! first use and honours the configured request timeout.
//!
//! - `connection`: ping and the roots change notification
//! - `tools`: list and call tools
//! - `resources`: list, read, templates, subscribe/unsubscribe
//! - `prompts`: list and render prompts
//! - `logging`: server log level
//! - `completion`: argument autocompletion
//!
//! Note: `roots/list`, `sampling/createMessage` and `elicitation/create` are
//! SERVER->CLIENT requests and live in the handler table, not here.
//!
//! [`McpSession::send_request`]: crate::McpSession::send_request
//! [`McpSession::send_notification`]: crate::McpSession::send_notification

pub mod completion;
pub mod connection;
pub mod logging;
pub mod prompts;
pub mod resources;
pub mod tools;

use async_trait::async_trait;
use mcp_session_protocol::McpResult;
use mcp_session_protocol::types::{Prompt, Resource, Tool};

use super::core::McpSession;
use crate::notifications::ListSource;

#[async_trait]
impl ListSource for McpSession {
    async fn all_tools(&self) -> McpResult<Vec<Tool>> {
        self.list_all_tools().await
    }

    async fn all_resources(&self) -> McpResult<Vec<Resource>> {
        self.list_all_resources().await
    }

    async fn all_prompts(&self) -> McpResult<Vec<Prompt>> {
        self.list_all_prompts().await
    }
}

/// `None` and `Some("")` both ask for the first page
pub(crate) fn normalize_cursor(
    cursor: Option<mcp_session_protocol::types::Cursor>,
) -> Option<mcp_session_protocol::types::Cursor> {
    cursor.filter(|c| !c.is_empty())
}
