//! Root registry.
//!
//! Roots are the filesystem (or other URI) locations the client exposes to the
//! server. The registry keeps them in insertion order, keyed by `uri`, and
//! runs every mutation together with its change callback under one async
//! mutex, so concurrent add/remove calls never interleave their
//! `notifications/roots/list_changed` messages.

use std::future::Future;

use mcp_session_protocol::types::Root;
use mcp_session_protocol::{McpError, McpResult};
use tokio::sync::Mutex;

/// Ordered set of [`Root`]s keyed by uri
#[derive(Debug, Default)]
pub struct RootRegistry {
    roots: Mutex<Vec<Root>>,
}

impl RootRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with `roots`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a root has an empty uri or two roots share a uri.
    pub fn with_roots(roots: impl IntoIterator<Item = Root>) -> McpResult<Self> {
        let mut seeded: Vec<Root> = Vec::new();
        for root in roots {
            validate(&seeded, &root)?;
            seeded.push(root);
        }
        Ok(Self {
            roots: Mutex::new(seeded),
        })
    }

    /// Snapshot of the current roots, in insertion order
    pub async fn list(&self) -> Vec<Root> {
        self.roots.lock().await.clone()
    }

    /// Number of registered roots
    pub async fn len(&self) -> usize {
        self.roots.lock().await.len()
    }

    /// Whether no root is registered
    pub async fn is_empty(&self) -> bool {
        self.roots.lock().await.is_empty()
    }

    /// Insert `root`.
    ///
    /// # Errors
    ///
    /// See [`RootRegistry::add_with`].
    pub async fn add(&self, root: Root) -> McpResult<()> {
        self.add_with(root, || async { Ok(()) }).await
    }

    /// Insert `root`, then run `on_change` before releasing the registry.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty or duplicate uri; otherwise whatever
    /// `on_change` returns. The root stays registered if `on_change` fails.
    pub async fn add_with<F, Fut>(&self, root: Root, on_change: F) -> McpResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = McpResult<()>>,
    {
        let mut roots = self.roots.lock().await;
        validate(&roots, &root)?;
        tracing::debug!("Adding root {}", root.uri);
        roots.push(root);
        on_change().await
    }

    /// Remove the root with `uri`.
    ///
    /// # Errors
    ///
    /// See [`RootRegistry::remove_with`].
    pub async fn remove(&self, uri: &str) -> McpResult<Root> {
        self.remove_with(uri, || async { Ok(()) }).await
    }

    /// Remove the root with `uri`, then run `on_change` before releasing the
    /// registry.
    ///
    /// # Errors
    ///
    /// `NotFound` if no root has that uri; otherwise whatever `on_change`
    /// returns.
    pub async fn remove_with<F, Fut>(&self, uri: &str, on_change: F) -> McpResult<Root>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = McpResult<()>>,
    {
        let mut roots = self.roots.lock().await;
        let Some(index) = roots.iter().position(|root| root.uri == uri) else {
            return Err(McpError::not_found(format!("Root with uri '{uri}' not found")));
        };
        let removed = roots.remove(index);
        tracing::debug!("Removed root {}", removed.uri);
        on_change().await?;
        Ok(removed)
    }
}

fn validate(existing: &[Root], root: &Root) -> McpResult<()> {
    if root.uri.is_empty() {
        return Err(McpError::invalid_argument("Root must not be null"));
    }
    if existing.iter().any(|r| r.uri == root.uri) {
        return Err(McpError::invalid_argument(format!(
            "Root with uri '{}' already exists",
            root.uri
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_session_protocol::ErrorKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn root(uri: &str) -> Root {
        Root::new(uri, None)
    }

    #[tokio::test]
    async fn test_add_keeps_insertion_order() {
        let registry = RootRegistry::new();
        registry.add(root("file:///b")).await.unwrap();
        registry.add(root("file:///a")).await.unwrap();

        let uris: Vec<_> = registry.list().await.into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["file:///b", "file:///a"]);
    }

    #[tokio::test]
    async fn test_duplicate_uri_is_rejected() {
        let registry = RootRegistry::new();
        registry.add(root("file:///a")).await.unwrap();

        let err = registry.add(root("file:///a")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(err.message.contains("file:///a"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_uri_is_rejected() {
        let err = RootRegistry::new().add(root("")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.message, "Root must not be null");
    }

    #[tokio::test]
    async fn test_remove_missing_names_uri() {
        let err = RootRegistry::new().remove("file:///gone").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Root with uri 'file:///gone' not found");
    }

    #[tokio::test]
    async fn test_failed_validation_skips_callback() {
        let registry = RootRegistry::with_roots([root("file:///a")]).unwrap();
        let calls = AtomicUsize::new(0);

        let _ = registry
            .add_with(root("file:///a"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        let _ = registry
            .remove_with("file:///x", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seeding_rejects_duplicates() {
        let err = RootRegistry::with_roots([root("file:///a"), root("file:///a")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_disjoint_mutations() {
        let registry = Arc::new(RootRegistry::new());
        let notifications = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for n in 0..32 {
            let registry = registry.clone();
            let notifications = notifications.clone();
            tasks.push(tokio::spawn(async move {
                let uri = format!("file:///root-{n}");
                registry
                    .add_with(root(&uri), || async {
                        notifications.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
                    .unwrap();
                if n % 2 == 0 {
                    registry
                        .remove_with(&uri, || async {
                            notifications.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.len().await, 16);
        assert_eq!(notifications.load(Ordering::SeqCst), 48);
    }
}
