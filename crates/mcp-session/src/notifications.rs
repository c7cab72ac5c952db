//! Notification fan-out.
//!
//! Every notification category keeps an insertion-ordered list of consumers.
//! Subscribing appends; nothing ever overwrites an earlier consumer. Delivery
//! walks a copy-on-write snapshot of the list, so a consumer subscribing while
//! a notification is being delivered neither blocks nor is blocked.
//!
//! For the three list-changed categories the server only says "something
//! changed". The dispatcher then refetches the complete list through a
//! [`ListSource`] (the session) and hands every consumer the fresh
//! collection. No consumers means no refetch.
//!
//! A consumer returning an error or panicking is logged and skipped; the
//! remaining consumers still run.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use mcp_session_protocol::methods;
use mcp_session_protocol::types::{
    CancelledNotification, LoggingMessageNotification, ProgressNotification, Prompt, Resource,
    ResourceUpdatedNotification, Tool,
};
use mcp_session_protocol::{JsonRpcNotification, McpResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::handlers::{HandlerResult, panic_message};

/// Receives one notification category
///
/// Implemented for any `Fn(T) -> impl Future<Output = HandlerResult<()>>`.
#[async_trait]
pub trait NotificationConsumer<T: Send + 'static>: Send + Sync {
    /// Handle one notification
    async fn consume(&self, item: T) -> HandlerResult<()>;
}

#[async_trait]
impl<T, F, Fut> NotificationConsumer<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<()>> + Send,
{
    async fn consume(&self, item: T) -> HandlerResult<()> {
        (self)(item).await
    }
}

/// Copy-on-write list of consumers for one category
pub struct ConsumerList<T: Send + 'static> {
    category: &'static str,
    consumers: RwLock<Arc<Vec<Arc<dyn NotificationConsumer<T>>>>>,
}

impl<T: Clone + Send + 'static> ConsumerList<T> {
    fn new(category: &'static str) -> Self {
        Self {
            category,
            consumers: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Append a consumer
    pub fn subscribe(&self, consumer: Arc<dyn NotificationConsumer<T>>) {
        let mut consumers = self.consumers.write();
        let mut next = Vec::with_capacity(consumers.len() + 1);
        next.extend(consumers.iter().cloned());
        next.push(consumer);
        *consumers = Arc::new(next);
        debug!("Subscribed {} consumer #{}", self.category, consumers.len());
    }

    /// Number of consumers
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.read().len()
    }

    /// Whether nobody listens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.read().is_empty()
    }

    /// Hand `item` to every consumer, in subscription order.
    ///
    /// Returns how many consumers completed without error.
    pub async fn deliver(&self, item: T) -> usize {
        let snapshot = Arc::clone(&self.consumers.read());
        let mut delivered = 0;
        for (index, consumer) in snapshot.iter().enumerate() {
            match AssertUnwindSafe(consumer.consume(item.clone()))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("{} consumer #{} failed: {}", self.category, index, e),
                Err(panic) => error!(
                    "{} consumer #{} panicked: {}",
                    self.category,
                    index,
                    panic_message(&*panic)
                ),
            }
        }
        trace!(
            "Delivered {} to {}/{} consumer(s)",
            self.category,
            delivered,
            snapshot.len()
        );
        delivered
    }
}

impl<T: Send + 'static> std::fmt::Debug for ConsumerList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerList")
            .field("category", &self.category)
            .field("consumers", &self.consumers.read().len())
            .finish()
    }
}

/// Source of complete lists for the list-changed refetch
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Every tool, across all pages
    async fn all_tools(&self) -> McpResult<Vec<Tool>>;
    /// Every resource, across all pages
    async fn all_resources(&self) -> McpResult<Vec<Resource>>;
    /// Every prompt, across all pages
    async fn all_prompts(&self) -> McpResult<Vec<Prompt>>;
}

/// Consumers for every notification category a session routes
#[derive(Debug)]
pub struct NotificationDispatcher {
    tools_changed: ConsumerList<Vec<Tool>>,
    resources_changed: ConsumerList<Vec<Resource>>,
    prompts_changed: ConsumerList<Vec<Prompt>>,
    logging: ConsumerList<LoggingMessageNotification>,
    progress: ConsumerList<ProgressNotification>,
    resource_updated: ConsumerList<ResourceUpdatedNotification>,
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self {
            tools_changed: ConsumerList::new("tools-changed"),
            resources_changed: ConsumerList::new("resources-changed"),
            prompts_changed: ConsumerList::new("prompts-changed"),
            logging: ConsumerList::new("logging-message"),
            progress: ConsumerList::new("progress"),
            resource_updated: ConsumerList::new("resource-updated"),
        }
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher with no consumers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumers of `notifications/tools/list_changed`
    pub fn tools_changed(&self) -> &ConsumerList<Vec<Tool>> {
        &self.tools_changed
    }

    /// Consumers of `notifications/resources/list_changed`
    pub fn resources_changed(&self) -> &ConsumerList<Vec<Resource>> {
        &self.resources_changed
    }

    /// Consumers of `notifications/prompts/list_changed`
    pub fn prompts_changed(&self) -> &ConsumerList<Vec<Prompt>> {
        &self.prompts_changed
    }

    /// Consumers of `notifications/message`
    pub fn logging(&self) -> &ConsumerList<LoggingMessageNotification> {
        &self.logging
    }

    /// Consumers of `notifications/progress`
    pub fn progress(&self) -> &ConsumerList<ProgressNotification> {
        &self.progress
    }

    /// Consumers of `notifications/resources/updated`
    pub fn resource_updated(&self) -> &ConsumerList<ResourceUpdatedNotification> {
        &self.resource_updated
    }

    /// Route one inbound notification to its category.
    ///
    /// `source` is used only for the list-changed refetch.
    pub async fn dispatch(&self, notification: JsonRpcNotification, source: &dyn ListSource) {
        let JsonRpcNotification { method, params, .. } = notification;
        match method.as_str() {
            methods::TOOLS_LIST_CHANGED => {
                if self.tools_changed.is_empty() {
                    debug!("No tools-changed consumers, skipping refetch");
                    return;
                }
                match source.all_tools().await {
                    Ok(tools) => {
                        self.tools_changed.deliver(tools).await;
                    }
                    Err(e) => warn!("Failed to refetch tools after list change: {}", e),
                }
            }
            methods::RESOURCES_LIST_CHANGED => {
                if self.resources_changed.is_empty() {
                    debug!("No resources-changed consumers, skipping refetch");
                    return;
                }
                match source.all_resources().await {
                    Ok(resources) => {
                        self.resources_changed.deliver(resources).await;
                    }
                    Err(e) => warn!("Failed to refetch resources after list change: {}", e),
                }
            }
            methods::PROMPTS_LIST_CHANGED => {
                if self.prompts_changed.is_empty() {
                    debug!("No prompts-changed consumers, skipping refetch");
                    return;
                }
                match source.all_prompts().await {
                    Ok(prompts) => {
                        self.prompts_changed.deliver(prompts).await;
                    }
                    Err(e) => warn!("Failed to refetch prompts after list change: {}", e),
                }
            }
            methods::LOGGING_MESSAGE => {
                if let Some(message) = parse::<LoggingMessageNotification>(&method, params) {
                    self.logging.deliver(message).await;
                }
            }
            methods::PROGRESS => {
                if let Some(progress) = parse::<ProgressNotification>(&method, params) {
                    self.progress.deliver(progress).await;
                }
            }
            methods::RESOURCES_UPDATED => {
                if let Some(updated) = parse::<ResourceUpdatedNotification>(&method, params) {
                    self.resource_updated.deliver(updated).await;
                }
            }
            methods::CANCELLED => {
                if let Some(cancelled) = parse::<CancelledNotification>(&method, params) {
                    debug!(
                        "Server cancelled request {}: {}",
                        cancelled.request_id,
                        cancelled.reason.as_deref().unwrap_or("no reason given")
                    );
                }
            }
            other => debug!("Ignoring unhandled notification {}", other),
        }
    }
}

fn parse<T: DeserializeOwned>(method: &str, params: Option<Value>) -> Option<T> {
    match serde_json::from_value(params.unwrap_or(Value::Null)) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Dropping malformed {} notification: {}", method, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerError;
    use mcp_session_protocol::McpError;
    use mcp_session_protocol::types::LoggingLevel;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FixedSource {
        tool_fetches: AtomicUsize,
    }

    #[async_trait]
    impl ListSource for FixedSource {
        async fn all_tools(&self) -> McpResult<Vec<Tool>> {
            self.tool_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![serde_json::from_value(json!({
                "name": "echo",
                "inputSchema": {"type": "object"}
            }))
            .unwrap()])
        }

        async fn all_resources(&self) -> McpResult<Vec<Resource>> {
            Err(McpError::session_closed("Session is closed"))
        }

        async fn all_prompts(&self) -> McpResult<Vec<Prompt>> {
            Ok(Vec::new())
        }
    }

    fn list_changed(method: &str) -> JsonRpcNotification {
        JsonRpcNotification::new(method, None)
    }

    #[tokio::test]
    async fn test_consumers_run_in_subscription_order() {
        let dispatcher = NotificationDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = seen.clone();
            dispatcher
                .tools_changed()
                .subscribe(Arc::new(move |tools: Vec<Tool>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().push((tag, tools.len()));
                        Ok::<_, HandlerError>(())
                    }
                }));
        }

        let source = FixedSource::default();
        dispatcher
            .dispatch(list_changed(methods::TOOLS_LIST_CHANGED), &source)
            .await;

        assert_eq!(*seen.lock(), vec![("first", 1), ("second", 1)]);
        assert_eq!(source.tool_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_consumers_skips_refetch() {
        let dispatcher = NotificationDispatcher::new();
        let source = FixedSource::default();
        dispatcher
            .dispatch(list_changed(methods::TOOLS_LIST_CHANGED), &source)
            .await;
        assert_eq!(source.tool_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_consumer_does_not_stop_others() {
        let list: ConsumerList<u32> = ConsumerList::new("test");
        let reached = Arc::new(AtomicUsize::new(0));

        list.subscribe(Arc::new(|_n: u32| async move {
            Err::<(), _>(HandlerError::Generic {
                message: "nope".into(),
            })
        }));
        list.subscribe(Arc::new(|_n: u32| async move {
            if true {
                panic!("consumer exploded");
            }
            Ok::<_, HandlerError>(())
        }));
        {
            let reached = reached.clone();
            list.subscribe(Arc::new(move |n: u32| {
                let reached = reached.clone();
                async move {
                    reached.fetch_add(n as usize, Ordering::SeqCst);
                    Ok::<_, HandlerError>(())
                }
            }));
        }

        assert_eq!(list.deliver(5).await, 1);
        assert_eq!(reached.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_logging_notification_is_parsed() {
        let dispatcher = NotificationDispatcher::new();
        let levels = Arc::new(Mutex::new(Vec::new()));
        {
            let levels = levels.clone();
            dispatcher
                .logging()
                .subscribe(Arc::new(move |message: LoggingMessageNotification| {
                    let levels = levels.clone();
                    async move {
                        levels.lock().push(message.level);
                        Ok::<_, HandlerError>(())
                    }
                }));
        }

        let source = FixedSource::default();
        dispatcher
            .dispatch(
                JsonRpcNotification::new(
                    methods::LOGGING_MESSAGE,
                    Some(json!({"level": "warning", "data": "disk almost full"})),
                ),
                &source,
            )
            .await;
        dispatcher
            .dispatch(
                JsonRpcNotification::new(methods::LOGGING_MESSAGE, Some(json!({"bogus": 1}))),
                &source,
            )
            .await;

        assert_eq!(*levels.lock(), vec![LoggingLevel::Warning]);
    }

    #[tokio::test]
    async fn test_refetch_failure_is_swallowed() {
        let dispatcher = NotificationDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = calls.clone();
            dispatcher
                .resources_changed()
                .subscribe(Arc::new(move |_resources: Vec<Resource>| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, HandlerError>(())
                    }
                }));
        }

        dispatcher
            .dispatch(
                list_changed(methods::RESOURCES_LIST_CHANGED),
                &FixedSource::default(),
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
