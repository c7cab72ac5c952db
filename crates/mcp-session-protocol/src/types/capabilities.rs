//! MCP capability negotiation types
//!
//! Capabilities are exchanged once during the initialization handshake. The
//! client declares [`ClientCapabilities`] up front; the server answers with
//! [`ServerCapabilities`].
//!
//! # Example
//!
//! ```rust
//! use mcp_session_protocol::types::ClientCapabilities;
//!
//! let caps = ClientCapabilities::builder()
//!     .roots(true)
//!     .sampling()
//!     .build();
//! assert!(caps.roots.is_some());
//! assert!(caps.elicitation.is_none());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Client capabilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Experimental, non-standard capabilities that the client supports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,

    /// Present if the client supports listing roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapabilities>,

    /// Present if the client supports sampling from an LLM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapabilities>,

    /// Present if the client supports elicitation from the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<ElicitationCapabilities>,
}

impl ClientCapabilities {
    /// Start building a capability set
    #[must_use]
    pub fn builder() -> ClientCapabilitiesBuilder {
        ClientCapabilitiesBuilder::default()
    }
}

/// Fluent builder for [`ClientCapabilities`]
#[derive(Debug, Default)]
pub struct ClientCapabilitiesBuilder {
    caps: ClientCapabilities,
}

impl ClientCapabilitiesBuilder {
    /// Declare roots support; `list_changed` advertises change notifications
    #[must_use]
    pub fn roots(mut self, list_changed: bool) -> Self {
        self.caps.roots = Some(RootsCapabilities {
            list_changed: Some(list_changed),
        });
        self
    }

    /// Declare sampling support
    #[must_use]
    pub fn sampling(mut self) -> Self {
        self.caps.sampling = Some(SamplingCapabilities {});
        self
    }

    /// Declare elicitation support
    #[must_use]
    pub fn elicitation(mut self) -> Self {
        self.caps.elicitation = Some(ElicitationCapabilities {});
        self
    }

    /// Add an experimental capability
    #[must_use]
    pub fn experimental(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.caps
            .experimental
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value);
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> ClientCapabilities {
        self.caps
    }
}

/// Server capabilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Experimental, non-standard capabilities that the server supports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,

    /// Present if the server supports sending log messages to the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingCapabilities>,

    /// Present if the server supports argument autocompletion suggestions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<CompletionCapabilities>,

    /// Present if the server offers any prompt templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapabilities>,

    /// Present if the server offers any resources to read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapabilities>,

    /// Present if the server offers any tools to call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapabilities>,
}

/// Sampling capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingCapabilities {}

/// Elicitation capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElicitationCapabilities {}

/// Completion capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCapabilities {}

/// Logging capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingCapabilities {}

/// Roots capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsCapabilities {
    /// Whether list can change
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Prompts capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptsCapabilities {
    /// Whether list can change
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Resources capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesCapabilities {
    /// Whether subscribe is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,

    /// Whether list can change
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Tools capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsCapabilities {
    /// Whether list can change
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}
