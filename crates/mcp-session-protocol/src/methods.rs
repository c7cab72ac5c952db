//! JSON-RPC method names used by MCP.

/// Handshake request
pub const INITIALIZE: &str = "initialize";
/// Handshake completion notification
pub const INITIALIZED: &str = "notifications/initialized";
/// Liveness check, valid in both directions
pub const PING: &str = "ping";

/// List tools
pub const TOOLS_LIST: &str = "tools/list";
/// Call a tool
pub const TOOLS_CALL: &str = "tools/call";

/// List resources
pub const RESOURCES_LIST: &str = "resources/list";
/// List resource templates
pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
/// Read a resource
pub const RESOURCES_READ: &str = "resources/read";
/// Subscribe to resource updates
pub const RESOURCES_SUBSCRIBE: &str = "resources/subscribe";
/// Unsubscribe from resource updates
pub const RESOURCES_UNSUBSCRIBE: &str = "resources/unsubscribe";

/// List prompts
pub const PROMPTS_LIST: &str = "prompts/list";
/// Render a prompt
pub const PROMPTS_GET: &str = "prompts/get";

/// Set the server's log level
pub const LOGGING_SET_LEVEL: &str = "logging/setLevel";
/// Argument completion
pub const COMPLETION_COMPLETE: &str = "completion/complete";

/// Server asks the client for its roots
pub const ROOTS_LIST: &str = "roots/list";
/// Server asks the client to sample an LLM
pub const SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";
/// Server asks the client to collect user input
pub const ELICITATION_CREATE: &str = "elicitation/create";

/// Tool list changed
pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
/// Resource list changed
pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
/// Prompt list changed
pub const PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
/// Subscribed resource changed
pub const RESOURCES_UPDATED: &str = "notifications/resources/updated";
/// Server log message
pub const LOGGING_MESSAGE: &str = "notifications/message";
/// Progress report
pub const PROGRESS: &str = "notifications/progress";
/// Request cancelled by the peer
pub const CANCELLED: &str = "notifications/cancelled";
/// Client roots changed
pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
