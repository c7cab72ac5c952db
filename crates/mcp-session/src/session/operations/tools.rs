//! Tool operations: listing tools and calling them.

use std::collections::HashMap;

use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    CallToolRequest, CallToolResult, Cursor, ListToolsResult, PaginatedRequest, Tool,
};
use mcp_session_protocol::{McpError, McpResult};
use serde_json::Value;

use super::normalize_cursor;
use crate::pagination::{Page, list_all};
use crate::session::core::{McpSession, to_params};

impl McpSession {
    /// Fetch one page of tools
    ///
    /// Pass `None` for the first page and the returned `next_cursor` for the
    /// following ones.
    ///
    /// # Errors
    ///
    /// Any error of [`send_request`](Self::send_request), or `Serialization`
    /// when the result does not match the tool list shape.
    pub async fn list_tools(&self, cursor: Option<Cursor>) -> McpResult<Page<Tool>> {
        let params = to_params(&PaginatedRequest::new(normalize_cursor(cursor)))?;
        let result: ListToolsResult = self.request(methods::TOOLS_LIST, Some(params)).await?;
        Ok(result.into())
    }

    /// Fetch every tool across all pages
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use mcp_session::McpSession;
    /// # async fn example(session: McpSession) -> mcp_session_protocol::McpResult<()> {
    /// for tool in session.list_all_tools().await? {
    ///     println!("{}: {}", tool.name, tool.description.as_deref().unwrap_or("-"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// The first page error; partial results are discarded.
    pub async fn list_all_tools(&self) -> McpResult<Vec<Tool>> {
        list_all(|cursor| self.list_tools(cursor)).await
    }

    /// Names of every tool
    ///
    /// # Errors
    ///
    /// As for [`list_all_tools`](Self::list_all_tools).
    pub async fn list_tool_names(&self) -> McpResult<Vec<String>> {
        let tools = self.list_all_tools().await?;
        Ok(tools.into_iter().map(|tool| tool.name).collect())
    }

    /// Call a tool by name
    ///
    /// A tool that runs but fails is reported in the result
    /// (`is_error: Some(true)`); an unknown tool comes back as `Rpc`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name, otherwise as for
    /// [`send_request`](Self::send_request).
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> McpResult<CallToolResult> {
        let mut request = CallToolRequest::new(name);
        request.arguments = arguments;
        self.call_tool_with(request).await
    }

    /// Call a tool with a fully built request (progress token included)
    ///
    /// # Errors
    ///
    /// As for [`call_tool`](Self::call_tool).
    pub async fn call_tool_with(&self, request: CallToolRequest) -> McpResult<CallToolResult> {
        if request.name.is_empty() {
            return Err(McpError::invalid_argument("Tool name must not be empty"));
        }
        tracing::debug!("Calling tool {}", request.name);
        self.request(methods::TOOLS_CALL, Some(to_params(&request)?))
            .await
    }
}
