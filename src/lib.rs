//! Colloquy -- provider-agnostic conversational orchestration.
//!
//! Drives chat-style LLM interactions with tool calling and
//! human-in-the-loop approval: a [`Chat`] owns the conversation history and
//! tool registry, a [`provider::ProviderAdapter`] binds it to one concrete
//! provider, and a session turns the provider's incremental token stream
//! into an ordered outbound event stream, a reconstructed history, and
//! approved tool invocations feeding the next round.

pub mod approval;
pub mod error;
pub mod history;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tools;
pub mod types;

pub use error::{ChatError, Result};
pub use history::History;
pub use session::Chat;
pub use tools::{AddOptions, Tool, ToolRegistry};
pub use types::{ChatEvent, EventKind, Sender, ToolCallEvent};
