//! Cursor pagination.
//!
//! A list operation returns one [`Page`] per call. `None` as the request
//! cursor asks for the first page; `None` as the returned cursor marks the
//! last page. An empty cursor string is treated the same as `None`.
//!
//! ```rust
//! use mcp_session::pagination::{Page, list_all};
//!
//! # tokio_test::block_on(async {
//! let all = list_all(|cursor: Option<String>| async move {
//!     Ok(match cursor.as_deref() {
//!         None => Page::new(vec![1, 2], Some("c1".to_string())),
//!         Some("c1") => Page::new(vec![3], None),
//!         Some(other) => unreachable!("unexpected cursor {other}"),
//!     })
//! })
//! .await?;
//! assert_eq!(all, vec![1, 2, 3]);
//! # Ok::<(), mcp_session_protocol::McpError>(())
//! # }).unwrap();
//! ```

use std::future::Future;

use futures::Stream;
use mcp_session_protocol::McpResult;
use mcp_session_protocol::types::{
    Cursor, ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    Prompt, Resource, ResourceTemplate, Tool,
};

/// One page of a paginated list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Build a page, treating an empty cursor as the end of the list
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Whether this is the final page
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

impl From<ListToolsResult> for Page<Tool> {
    fn from(result: ListToolsResult) -> Self {
        Self::new(result.tools, result.next_cursor)
    }
}

impl From<ListResourcesResult> for Page<Resource> {
    fn from(result: ListResourcesResult) -> Self {
        Self::new(result.resources, result.next_cursor)
    }
}

impl From<ListResourceTemplatesResult> for Page<ResourceTemplate> {
    fn from(result: ListResourceTemplatesResult) -> Self {
        Self::new(result.resource_templates, result.next_cursor)
    }
}

impl From<ListPromptsResult> for Page<Prompt> {
    fn from(result: ListPromptsResult) -> Self {
        Self::new(result.prompts, result.next_cursor)
    }
}

/// Fetch every page, starting from `None`, and concatenate the items.
///
/// # Errors
///
/// The first error returned by `fetch`; items gathered so far are discarded.
pub async fn list_all<T, F, Fut>(mut fetch: F) -> McpResult<Vec<T>>
where
    F: FnMut(Option<Cursor>) -> Fut,
    Fut: Future<Output = McpResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;
    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    tracing::trace!("Fetched {} item(s) across {} page(s)", items.len(), pages);
    Ok(items)
}

/// Walk the pages lazily as a stream.
///
/// The stream ends after the last page or right after the first error.
pub fn pages<T, F, Fut>(fetch: F) -> impl Stream<Item = McpResult<Page<T>>>
where
    F: FnMut(Option<Cursor>) -> Fut,
    Fut: Future<Output = McpResult<Page<T>>>,
{
    // `Some(cursor)` while there is a page left to request.
    futures::stream::unfold(
        (fetch, Some(None::<Cursor>)),
        |(mut fetch, next)| async move {
            let cursor = next?;
            match fetch(cursor).await {
                Ok(page) => {
                    let following = page.next_cursor.clone().map(Some);
                    Some((Ok(page), (fetch, following)))
                }
                Err(e) => Some((Err(e), (fetch, None))),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use mcp_session_protocol::{ErrorKind, McpError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn three_pages() -> (
        Arc<Mutex<Vec<Option<Cursor>>>>,
        impl FnMut(Option<Cursor>) -> futures::future::Ready<McpResult<Page<&'static str>>>,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let fetch = move |cursor: Option<Cursor>| {
            recorded.lock().push(cursor.clone());
            let page = match cursor.as_deref() {
                None => Page::new(vec!["a", "b"], Some("c1".into())),
                Some("c1") => Page::new(vec!["c"], Some("c2".into())),
                Some("c2") => Page::new(vec!["d"], None),
                Some(other) => panic!("unexpected cursor {other}"),
            };
            futures::future::ready(Ok(page))
        };
        (calls, fetch)
    }

    #[tokio::test]
    async fn test_list_all_walks_three_pages_in_order() {
        let (calls, fetch) = three_pages();
        let items = list_all(fetch).await.unwrap();

        assert_eq!(items, vec!["a", "b", "c", "d"]);
        assert_eq!(
            *calls.lock(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_cursor_ends_listing() {
        let items = list_all(|_cursor| async { Ok(Page::new(vec![1], Some(String::new()))) })
            .await
            .unwrap();
        assert_eq!(items, vec![1]);
    }

    #[tokio::test]
    async fn test_error_aborts_listing() {
        let err = list_all(|cursor: Option<Cursor>| async move {
            match cursor {
                None => Ok(Page::new(vec![1], Some("next".into()))),
                Some(_) => Err(McpError::timeout("page timed out")),
            }
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_pages_stream_yields_each_page() {
        let (calls, fetch) = three_pages();
        let pages: Vec<_> = pages(fetch).collect().await;

        assert_eq!(pages.len(), 3);
        assert!(pages[2].as_ref().unwrap().is_last());
        assert_eq!(calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_pages_stream_stops_after_error() {
        let stream = pages(|_cursor: Option<Cursor>| async {
            Err::<Page<u8>, _>(McpError::session_closed("Session is closed"))
        });
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 1);
        assert!(collected[0].is_err());
    }
}
