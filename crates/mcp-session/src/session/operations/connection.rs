//! Connection utilities: health check and roots change announcement.

use mcp_session_protocol::McpResult;
use mcp_session_protocol::methods;
use mcp_session_protocol::types::EmptyResult;

use crate::session::core::McpSession;

impl McpSession {
    /// Check that the server is responding
    ///
    /// # Errors
    ///
    /// `Timeout` when the server does not answer in time, `SessionClosed`
    /// after close, `Rpc` if the server rejects the ping.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use mcp_session::McpSession;
    /// # async fn example(session: McpSession) -> mcp_session_protocol::McpResult<()> {
    /// session.ping().await?;
    /// println!("Server is responding");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn ping(&self) -> McpResult<()> {
        let _: EmptyResult = self.request(methods::PING, None).await?;
        Ok(())
    }

    /// Tell the server the root list changed.
    ///
    /// [`add_root`](Self::add_root) and [`remove_root`](Self::remove_root)
    /// already do this; call it directly when roots are managed elsewhere.
    ///
    /// # Errors
    ///
    /// `SessionClosed` after close, `Transport` if the write fails.
    pub async fn roots_list_changed_notification(&self) -> McpResult<()> {
        self.send_notification(methods::ROOTS_LIST_CHANGED, None)
            .await
    }
}
