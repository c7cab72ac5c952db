//! Negotiated capabilities.
//!
//! The client side is fixed when the session is built. The server side is
//! recorded exactly once, from the `initialize` result, and is read-only
//! afterwards. The session never refuses a call because the server did not
//! advertise it; the `server_supports_*` helpers are for callers that want to
//! check first.

use std::sync::OnceLock;

use mcp_session_protocol::types::{
    ClientCapabilities, Implementation, InitializeResult, ServerCapabilities,
};

#[derive(Debug)]
pub(crate) struct CapabilityRegistry {
    local: ClientCapabilities,
    remote: OnceLock<InitializeResult>,
}

impl CapabilityRegistry {
    pub(crate) fn new(local: ClientCapabilities) -> Self {
        Self {
            local,
            remote: OnceLock::new(),
        }
    }

    pub(crate) fn local(&self) -> &ClientCapabilities {
        &self.local
    }

    /// Record the handshake result. Later calls are ignored.
    pub(crate) fn record(&self, result: InitializeResult) -> bool {
        let recorded = self.remote.set(result).is_ok();
        if !recorded {
            tracing::warn!("Server capabilities already recorded, ignoring second handshake result");
        }
        recorded
    }

    pub(crate) fn initialize_result(&self) -> Option<&InitializeResult> {
        self.remote.get()
    }

    pub(crate) fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.remote.get().map(|r| &r.capabilities)
    }

    pub(crate) fn server_info(&self) -> Option<&Implementation> {
        self.remote.get().map(|r| &r.server_info)
    }

    pub(crate) fn protocol_version(&self) -> Option<&str> {
        self.remote.get().map(|r| r.protocol_version.as_str())
    }

    pub(crate) fn instructions(&self) -> Option<&str> {
        self.remote.get().and_then(|r| r.instructions.as_deref())
    }

    pub(crate) fn declares_roots(&self) -> bool {
        self.local.roots.is_some()
    }

    pub(crate) fn server_supports_tools(&self) -> bool {
        self.server_capabilities().is_some_and(|c| c.tools.is_some())
    }

    pub(crate) fn server_supports_resources(&self) -> bool {
        self.server_capabilities()
            .is_some_and(|c| c.resources.is_some())
    }

    pub(crate) fn server_supports_resource_subscriptions(&self) -> bool {
        self.server_capabilities().is_some_and(|c| {
            c.resources
                .as_ref()
                .is_some_and(|r| r.subscribe.unwrap_or(false))
        })
    }

    pub(crate) fn server_supports_prompts(&self) -> bool {
        self.server_capabilities().is_some_and(|c| c.prompts.is_some())
    }

    pub(crate) fn server_supports_logging(&self) -> bool {
        self.server_capabilities().is_some_and(|c| c.logging.is_some())
    }

    pub(crate) fn server_supports_completions(&self) -> bool {
        self.server_capabilities()
            .is_some_and(|c| c.completions.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handshake(capabilities: serde_json::Value) -> InitializeResult {
        serde_json::from_value(json!({
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "serverInfo": {"name": "fake", "version": "1.0.0"},
            "instructions": "be nice"
        }))
        .unwrap()
    }

    #[test]
    fn test_remote_recorded_once() {
        let registry = CapabilityRegistry::new(ClientCapabilities::default());
        assert!(registry.server_capabilities().is_none());

        assert!(registry.record(handshake(json!({"tools": {}}))));
        assert!(!registry.record(handshake(json!({}))));

        assert!(registry.server_supports_tools());
        assert!(!registry.server_supports_prompts());
        assert_eq!(registry.server_info().unwrap().name, "fake");
        assert_eq!(registry.protocol_version(), Some("2025-06-18"));
        assert_eq!(registry.instructions(), Some("be nice"));
    }

    #[test]
    fn test_resource_subscription_flag() {
        let registry = CapabilityRegistry::new(ClientCapabilities::default());
        registry.record(handshake(json!({"resources": {"subscribe": true}})));
        assert!(registry.server_supports_resources());
        assert!(registry.server_supports_resource_subscriptions());
    }

    #[test]
    fn test_local_roots_declaration() {
        let registry = CapabilityRegistry::new(ClientCapabilities::builder().roots(true).build());
        assert!(registry.declares_roots());

        let registry = CapabilityRegistry::new(ClientCapabilities::default());
        assert!(!registry.declares_roots());
    }
}
