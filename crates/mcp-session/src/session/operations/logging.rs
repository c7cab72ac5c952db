//! Server log level control.

use mcp_session_protocol::McpResult;
use mcp_session_protocol::methods;
use mcp_session_protocol::types::{EmptyResult, LoggingLevel, SetLevelRequest};

use crate::session::core::{McpSession, to_params};

impl McpSession {
    /// Set the minimum level of `notifications/message` the server sends
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request).
    pub async fn set_logging_level(&self, level: LoggingLevel) -> McpResult<()> {
        let params = to_params(&SetLevelRequest { level })?;
        let _: EmptyResult = self
            .request(methods::LOGGING_SET_LEVEL, Some(params))
            .await?;
        tracing::debug!("Server logging level set to {}", level);
        Ok(())
    }

    /// [`set_logging_level`](Self::set_logging_level) from a level name
    ///
    /// # Errors
    ///
    /// `InvalidArgument("Logging level must not be null")` for an empty
    /// string and `InvalidArgument` for an unknown name; nothing is sent in
    /// either case.
    pub async fn set_logging_level_str(&self, level: &str) -> McpResult<()> {
        let level: LoggingLevel = level.parse()?;
        self.set_logging_level(level).await
    }
}
