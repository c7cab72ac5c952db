//! MCP payload types
//!
//! # Module Organization
//!
//! - [`core`] - Shared building blocks (implementation info, roles, cursors)
//! - [`capabilities`] - Client/server capability negotiation
//! - [`initialization`] - Handshake request/result and protocol versions
//! - [`content`] - Message content blocks
//! - [`tools`] - Tool listing and calling
//! - [`resources`] - Resources, templates, subscriptions
//! - [`prompts`] - Prompt templates
//! - [`logging`] - Log levels and log notifications
//! - [`sampling`] - LLM sampling (server to client)
//! - [`elicitation`] - User input elicitation (server to client)
//! - [`roots`] - Filesystem roots
//! - [`completion`] - Argument autocompletion
//! - [`notifications`] - Progress and cancellation notifications

pub mod capabilities;
pub mod completion;
pub mod content;
pub mod core;
pub mod elicitation;
pub mod initialization;
pub mod logging;
pub mod notifications;
pub mod prompts;
pub mod resources;
pub mod roots;
pub mod sampling;
pub mod tools;

pub use capabilities::*;
pub use completion::*;
pub use content::*;
pub use self::core::*;
pub use elicitation::*;
pub use initialization::*;
pub use logging::*;
pub use notifications::*;
pub use prompts::*;
pub use resources::*;
pub use roots::*;
pub use sampling::*;
pub use tools::*;
