//! Schema translation subsystem.
//!
//! # Data Flow
//! ```text
//! downstream body bytes
//!     → request.rs (parse object, validate model, decode ChatRequest)
//!     → messages.rs (role normalisation, tool call shape)
//!     → tools.rs (legacy functions → tools, tool_choice coercion)
//!     → request.rs (assemble UpstreamRequest)
//!
//! buffered upstream body
//!     → response.rs (model rewrite)
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous: no I/O, no logging, no shared state
//! - Wire shapes are typed; fields the proxy does not understand ride along
//!   in flattened maps so nothing is lost in translation
//! - Legacy `functions` vs modern `tools` is resolved once into a two-variant
//!   enum instead of being inspected field by field

pub mod messages;
pub mod request;
pub mod response;
pub mod tools;
pub mod types;

pub use messages::translate_messages;
pub use request::{build_upstream_request, decode_chat_request, parse_body, validate_model};
pub use response::rewrite_response_model;
pub use tools::{translate_tool_choice, translate_tools, ToolDeclarations};
pub use types::{ChatRequest, Message, Role, Tool, ToolCall, ToolChoice, UpstreamRequest, UpstreamTools};
