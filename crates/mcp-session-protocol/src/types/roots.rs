//! Filesystem root types

use serde::{Deserialize, Serialize};

use super::core::Uri;

/// A root the client exposes to the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root {
    /// Root URI (unique key)
    pub uri: Uri,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Root {
    /// Create a root
    #[must_use]
    pub fn new(uri: impl Into<Uri>, name: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            name,
        }
    }
}

/// `roots/list` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRootsResult {
    /// Current roots
    pub roots: Vec<Root>,
    /// Optional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _meta: Option<serde_json::Value>,
}
