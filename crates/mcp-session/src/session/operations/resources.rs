//! Resource operations: listing, reading, templates and subscriptions.

use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    Cursor, EmptyResult, ListResourceTemplatesResult, ListResourcesResult, PaginatedRequest,
    ReadResourceRequest, ReadResourceResult, Resource, ResourceTemplate, SubscribeRequest,
    UnsubscribeRequest,
};
use mcp_session_protocol::{McpError, McpResult};

use super::normalize_cursor;
use crate::pagination::{Page, list_all};
use crate::session::core::{McpSession, to_params};

impl McpSession {
    /// Fetch one page of resources
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request).
    pub async fn list_resources(&self, cursor: Option<Cursor>) -> McpResult<Page<Resource>> {
        let params = to_params(&PaginatedRequest::new(normalize_cursor(cursor)))?;
        let result: ListResourcesResult =
            self.request(methods::RESOURCES_LIST, Some(params)).await?;
        Ok(result.into())
    }

    /// Fetch every resource across all pages
    ///
    /// # Errors
    ///
    /// The first page error; partial results are discarded.
    pub async fn list_all_resources(&self) -> McpResult<Vec<Resource>> {
        list_all(|cursor| self.list_resources(cursor)).await
    }

    /// Read the contents of the resource at `uri`
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use mcp_session::McpSession;
    /// # async fn example(session: McpSession) -> mcp_session_protocol::McpResult<()> {
    /// let result = session.read_resource("file:///README.md").await?;
    /// for contents in result.contents {
    ///     println!("{}", contents.uri());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty uri, `Rpc` for an unknown resource.
    pub async fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        require_uri(uri)?;
        let params = to_params(&ReadResourceRequest {
            uri: uri.to_string(),
        })?;
        self.request(methods::RESOURCES_READ, Some(params)).await
    }

    /// Fetch one page of resource templates
    ///
    /// # Errors
    ///
    /// As for [`send_request`](Self::send_request).
    pub async fn list_resource_templates(
        &self,
        cursor: Option<Cursor>,
    ) -> McpResult<Page<ResourceTemplate>> {
        let params = to_params(&PaginatedRequest::new(normalize_cursor(cursor)))?;
        let result: ListResourceTemplatesResult = self
            .request(methods::RESOURCES_TEMPLATES_LIST, Some(params))
            .await?;
        Ok(result.into())
    }

    /// Fetch every resource template across all pages
    ///
    /// # Errors
    ///
    /// The first page error; partial results are discarded.
    pub async fn list_all_resource_templates(&self) -> McpResult<Vec<ResourceTemplate>> {
        list_all(|cursor| self.list_resource_templates(cursor)).await
    }

    /// Ask the server to send `notifications/resources/updated` for `uri`
    ///
    /// Register a consumer with [`on_resource_updated`](Self::on_resource_updated)
    /// to receive them.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty uri, `Rpc` if the server refuses.
    pub async fn subscribe_resource(&self, uri: &str) -> McpResult<()> {
        require_uri(uri)?;
        let params = to_params(&SubscribeRequest {
            uri: uri.to_string(),
        })?;
        let _: EmptyResult = self
            .request(methods::RESOURCES_SUBSCRIBE, Some(params))
            .await?;
        Ok(())
    }

    /// Stop update notifications for `uri`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty uri, `Rpc` if the server refuses.
    pub async fn unsubscribe_resource(&self, uri: &str) -> McpResult<()> {
        require_uri(uri)?;
        let params = to_params(&UnsubscribeRequest {
            uri: uri.to_string(),
        })?;
        let _: EmptyResult = self
            .request(methods::RESOURCES_UNSUBSCRIBE, Some(params))
            .await?;
        Ok(())
    }
}

fn require_uri(uri: &str) -> McpResult<()> {
    if uri.is_empty() {
        return Err(McpError::invalid_argument("Resource URI must not be empty"));
    }
    Ok(())
}
