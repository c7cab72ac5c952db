//! Argument autocompletion.

use mcp_session_protocol::McpResult;
use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    CompleteRequest, CompleteResult, CompletionArgument, CompletionReference,
};

use crate::session::core::{McpSession, to_params};

impl McpSession {
    /// Ask the server for completions of `argument` under `reference`
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request).
    pub async fn complete(
        &self,
        reference: CompletionReference,
        argument: CompletionArgument,
    ) -> McpResult<CompleteResult> {
        let params = to_params(&CompleteRequest {
            reference,
            argument,
        })?;
        self.request(methods::COMPLETION_COMPLETE, Some(params))
            .await
    }

    /// Complete an argument of the prompt `prompt`
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use mcp_session::McpSession;
    /// # async fn example(session: McpSession) -> mcp_session_protocol::McpResult<()> {
    /// let result = session.complete_prompt("code_review", "language", "ru").await?;
    /// for value in result.completion.values {
    ///     println!("{value}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// As for [`complete`](Self::complete).
    pub async fn complete_prompt(
        &self,
        prompt: &str,
        argument: &str,
        value: &str,
    ) -> McpResult<CompleteResult> {
        self.complete(
            CompletionReference::Prompt {
                name: prompt.to_string(),
            },
            CompletionArgument {
                name: argument.to_string(),
                value: value.to_string(),
            },
        )
        .await
    }

    /// Complete a variable of the resource template `uri`
    ///
    /// # Errors
    ///
    /// As for [`complete`](Self::complete).
    pub async fn complete_resource(
        &self,
        uri: &str,
        argument: &str,
        value: &str,
    ) -> McpResult<CompleteResult> {
        self.complete(
            CompletionReference::Resource {
                uri: uri.to_string(),
            },
            CompletionArgument {
                name: argument.to_string(),
                value: value.to_string(),
            },
        )
        .await
    }
}
