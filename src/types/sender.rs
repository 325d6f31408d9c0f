//! Message sender tags.

/// Identifies who a message in the chat comes from.
///
/// Used by [`crate::Chat::add_message`] to construct the matching history
/// event. Only `User`, `Assistant` and `System` translate into plain text
/// messages; tool results and tool-call seeds are appended through
/// [`crate::Chat::append_event`] with explicit constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    System,
    Tool,
    /// An assistant-issued tool call, identified by its call id and tool name.
    ToolCaller { call_id: String, name: String },
}
