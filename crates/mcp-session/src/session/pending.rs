//! Pending request table.
//!
//! Every outbound request owns one entry from the moment it is registered
//! until exactly one of these happens:
//!
//! ```text
//!   response routed by the receive loop   -> complete()
//!   deadline fires in the waiting caller  -> expire()
//!   caller future dropped                 -> PendingGuard::drop
//!   session closed / connection lost      -> fail_all()
//! ```
//!
//! Removal under the table lock decides the winner: whichever side takes the
//! entry out of the map fulfils the completion slot, the other side sees
//! nothing to remove. That is what makes a response and a timeout for the
//! same id mutually exclusive.

use std::collections::HashMap;

use mcp_session_protocol::{McpError, McpResult, RequestId};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

/// Outcome delivered to a waiting caller
pub(crate) type Completion = McpResult<Value>;

#[derive(Debug)]
struct PendingEntry {
    method: String,
    deadline: Instant,
    sender: oneshot::Sender<Completion>,
}

/// Thread-safe map `RequestId -> pending entry`
#[derive(Debug)]
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<RequestId, PendingEntry>>,
    count: watch::Sender<usize>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            entries: Mutex::new(HashMap::new()),
            count,
        }
    }

    /// Register a new in-flight request.
    ///
    /// Fails with `DuplicateRequestId` if `id` is already pending.
    pub(crate) fn register(
        &self,
        id: RequestId,
        method: &str,
        deadline: Instant,
    ) -> McpResult<oneshot::Receiver<Completion>> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&id) {
            return Err(McpError::duplicate_request_id(&id));
        }
        let (sender, receiver) = oneshot::channel();
        entries.insert(
            id,
            PendingEntry {
                method: method.to_string(),
                deadline,
                sender,
            },
        );
        self.count.send_replace(entries.len());
        Ok(receiver)
    }

    /// Fulfil the entry for `id`. Returns `false` if no such entry exists.
    pub(crate) fn complete(&self, id: &RequestId, outcome: Completion) -> bool {
        let Some(entry) = self.take(id) else {
            return false;
        };
        tracing::trace!(
            "Completed request {} ({}) with {:?} to spare",
            id,
            entry.method,
            entry.deadline.saturating_duration_since(Instant::now())
        );
        // The waiter may have been dropped in the meantime; nothing to deliver then.
        let _ = entry.sender.send(outcome);
        true
    }

    /// Remove the entry for `id` because its deadline fired.
    ///
    /// Returns `false` if a response already took the entry.
    pub(crate) fn expire(&self, id: &RequestId) -> bool {
        self.take(id).is_some()
    }

    /// Remove the entry for `id` without fulfilling it.
    pub(crate) fn remove(&self, id: &RequestId) -> bool {
        self.take(id).is_some()
    }

    /// Fail every pending request with `error`. Returns how many were failed.
    pub(crate) fn fail_all(&self, error: &McpError) -> usize {
        let drained: Vec<(RequestId, PendingEntry)> = {
            let mut entries = self.entries.lock();
            let drained = entries.drain().collect();
            self.count.send_replace(0);
            drained
        };
        let failed = drained.len();
        for (id, entry) in drained {
            let _ = entry
                .sender
                .send(Err(error.clone().with_operation(entry.method).with_request_id(id.to_string())));
        }
        failed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Resolve once no request is pending.
    pub(crate) async fn wait_until_empty(&self) {
        let mut count = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = count.wait_for(|n| *n == 0).await;
    }

    fn take(&self, id: &RequestId) -> Option<PendingEntry> {
        let mut entries = self.entries.lock();
        let entry = entries.remove(id);
        if entry.is_some() {
            self.count.send_replace(entries.len());
        }
        entry
    }
}

/// Removes a pending entry when the waiting caller goes away.
pub(crate) struct PendingGuard<'a> {
    table: &'a PendingRequests,
    id: RequestId,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn new(table: &'a PendingRequests, id: RequestId) -> Self {
        Self { table, id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.table.remove(&self.id) {
            tracing::debug!("Abandoned pending request {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_session_protocol::ErrorKind;
    use serde_json::json;
    use std::time::Duration;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_id() {
        let table = PendingRequests::new();
        let _rx = table.register("a-1".into(), "ping", deadline()).unwrap();
        let err = table.register("a-1".into(), "ping", deadline()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateRequestId);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_delivers_once() {
        let table = PendingRequests::new();
        let rx = table.register("a-1".into(), "ping", deadline()).unwrap();

        assert!(table.complete(&"a-1".into(), Ok(json!({"ok": true}))));
        assert!(!table.complete(&"a-1".into(), Ok(json!({"ok": false}))));
        assert_eq!(rx.await.unwrap().unwrap(), json!({"ok": true}));
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_ignored() {
        let table = PendingRequests::new();
        assert!(!table.complete(&RequestId::Number(99), Ok(Value::Null)));
    }

    #[tokio::test]
    async fn test_expire_and_complete_are_mutually_exclusive() {
        let table = PendingRequests::new();
        let _rx = table.register("a-1".into(), "ping", deadline()).unwrap();
        assert!(table.expire(&"a-1".into()));
        assert!(!table.complete(&"a-1".into(), Ok(Value::Null)));

        let rx = table.register("a-2".into(), "ping", deadline()).unwrap();
        assert!(table.complete(&"a-2".into(), Ok(Value::Null)));
        assert!(!table.expire(&"a-2".into()));
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_fail_all_drains_table() {
        let table = PendingRequests::new();
        let receivers: Vec<_> = (0..3)
            .map(|n| table.register(RequestId::Number(n), "tools/list", deadline()).unwrap())
            .collect();

        let failed = table.fail_all(&McpError::session_closed("session closed"));
        assert_eq!(failed, 3);
        assert_eq!(table.len(), 0);
        for rx in receivers {
            let err = rx.await.unwrap().unwrap_err();
            assert_eq!(err.kind, ErrorKind::SessionClosed);
            assert_eq!(err.message, "session closed");
        }
    }

    #[tokio::test]
    async fn test_guard_removes_abandoned_entry() {
        let table = PendingRequests::new();
        let _rx = table.register("a-1".into(), "ping", deadline()).unwrap();
        {
            let _guard = PendingGuard::new(&table, "a-1".into());
        }
        assert_eq!(table.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_empty_tracks_removals() {
        let table = std::sync::Arc::new(PendingRequests::new());
        let _rx = table.register("a-1".into(), "ping", deadline()).unwrap();

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.wait_until_empty().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        table.complete(&"a-1".into(), Ok(Value::Null));
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
