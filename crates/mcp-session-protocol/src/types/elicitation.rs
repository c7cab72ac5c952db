//! Elicitation types (`elicitation/create`, server to client)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `elicitation/create` parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElicitRequest {
    /// Message shown to the user
    pub message: String,
    /// Restricted JSON Schema describing the requested fields
    #[serde(rename = "requestedSchema")]
    pub requested_schema: serde_json::Value,
}

/// User's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElicitationAction {
    /// Submitted
    Accept,
    /// Explicitly declined
    Decline,
    /// Dismissed
    Cancel,
}

/// `elicitation/create` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElicitResult {
    /// Action taken
    pub action: ElicitationAction,
    /// Submitted values, present when accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HashMap<String, serde_json::Value>>,
}
