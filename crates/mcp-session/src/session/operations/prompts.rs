//! Prompt operations.

use std::collections::HashMap;

use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    Cursor, GetPromptRequest, GetPromptResult, ListPromptsResult, PaginatedRequest, Prompt,
};
use mcp_session_protocol::{McpError, McpResult};

use super::normalize_cursor;
use crate::pagination::{Page, list_all};
use crate::session::core::{McpSession, to_params};

impl McpSession {
    /// Fetch one page of prompts
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request).
    pub async fn list_prompts(&self, cursor: Option<Cursor>) -> McpResult<Page<Prompt>> {
        let params = to_params(&PaginatedRequest::new(normalize_cursor(cursor)))?;
        let result: ListPromptsResult = self.request(methods::PROMPTS_LIST, Some(params)).await?;
        Ok(result.into())
    }

    /// Fetch every prompt across all pages
    ///
    /// # Errors
    ///
    /// The first page error; partial results are discarded.
    pub async fn list_all_prompts(&self) -> McpResult<Vec<Prompt>> {
        list_all(|cursor| self.list_prompts(cursor)).await
    }

    /// Render the prompt `name` with `arguments`
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::collections::HashMap;
    /// # use mcp_session::McpSession;
    /// # async fn example(session: McpSession) -> mcp_session_protocol::McpResult<()> {
    /// let mut args = HashMap::new();
    /// args.insert("language".to_string(), "rust".to_string());
    /// let prompt = session.get_prompt("code_review", Some(args)).await?;
    /// println!("{} message(s)", prompt.messages.len());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name, `Rpc` for an unknown prompt or
    /// missing required arguments.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> McpResult<GetPromptResult> {
        if name.is_empty() {
            return Err(McpError::invalid_argument("Prompt name must not be empty"));
        }
        let params = to_params(&GetPromptRequest {
            name: name.to_string(),
            arguments,
        })?;
        self.request(methods::PROMPTS_GET, Some(params)).await
    }
}
