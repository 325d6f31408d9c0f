//! Core types: stream events and message senders.

pub mod event;
pub mod sender;

pub use event::{ChatEvent, EventKind, ToolCallEvent};
pub use sender::Sender;
