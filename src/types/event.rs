//! Stream event types.

use crate::approval::{ApprovalHandle, Verdict};
use crate::error::ChatError;

/// A single event on a chat stream.
///
/// Streaming variants (`Token`, fragmented `ToolCall`, `Refusal`) originate
/// from the provider; message variants are durable history entries produced
/// by the consumer or reassembled by the session orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// An incremental text chunk from the provider.
    Token { text: String },
    /// A tool invocation requested by the model. On the wire this may be a
    /// fragment (empty `call_id` = continuation of the previous call); on
    /// the outbound stream and in history it is always a completed record.
    ToolCall(ToolCallEvent),
    /// The model refused to produce content.
    Refusal { text: String },
    /// A message supplied by the consumer on behalf of the user.
    UserMessage { text: String },
    /// A completed assistant message (concatenated tokens of one round).
    AssistantMessage { text: String },
    /// A system instruction supplied by the consumer.
    SystemMessage { text: String },
    /// The result of a tool invocation, linked to its call by `call_id`.
    ToolMessage {
        call_id: String,
        text: String,
        success: bool,
    },
    /// An error surfaced on the stream.
    Error { error: ChatError },
    /// Marks the end of one completion round.
    CompletionEnded,
}

impl ChatEvent {
    /// Create a token event.
    pub fn token(text: impl Into<String>) -> Self {
        Self::Token { text: text.into() }
    }

    /// Create a completed (or first-fragment) tool call event.
    pub fn tool_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCall(ToolCallEvent::new(call_id, name, arguments))
    }

    /// Create a refusal event.
    pub fn refusal(text: impl Into<String>) -> Self {
        Self::Refusal { text: text.into() }
    }

    /// Create a user message event.
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserMessage { text: text.into() }
    }

    /// Create an assistant message event.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::AssistantMessage { text: text.into() }
    }

    /// Create a system message event.
    pub fn system(text: impl Into<String>) -> Self {
        Self::SystemMessage { text: text.into() }
    }

    /// Create a tool result message event.
    pub fn tool_message(
        call_id: impl Into<String>,
        text: impl Into<String>,
        success: bool,
    ) -> Self {
        Self::ToolMessage {
            call_id: call_id.into(),
            text: text.into(),
            success,
        }
    }

    /// Create an error event.
    pub fn error(error: ChatError) -> Self {
        Self::Error { error }
    }

    /// The stable discriminator of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Token { .. } => EventKind::Token,
            Self::ToolCall(_) => EventKind::ToolCall,
            Self::Refusal { .. } => EventKind::Refusal,
            Self::UserMessage { .. } => EventKind::UserMessage,
            Self::AssistantMessage { .. } => EventKind::AssistantMessage,
            Self::SystemMessage { .. } => EventKind::SystemMessage,
            Self::ToolMessage { .. } => EventKind::ToolMessage,
            Self::Error { .. } => EventKind::Error,
            Self::CompletionEnded => EventKind::CompletionEnded,
        }
    }
}

/// Discriminator for [`ChatEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Token,
    ToolCall,
    Refusal,
    UserMessage,
    AssistantMessage,
    SystemMessage,
    ToolMessage,
    Error,
    CompletionEnded,
}

/// A tool invocation requested by the model.
///
/// `arguments` holds the raw JSON argument string; while a call is being
/// assembled from stream fragments the orchestrator appends continuation
/// chunks to it. Once attached to a round's approval gate, [`Self::resolve`]
/// delivers the consumer's verdict. Clones share the underlying approval
/// handle, so resolving any clone resolves the call.
#[derive(Clone)]
pub struct ToolCallEvent {
    /// Provider-assigned id of the call. Empty on continuation fragments.
    pub call_id: String,
    /// Name of the tool being called.
    pub name: String,
    /// Raw JSON arguments (possibly partial while streaming).
    pub arguments: String,
    pub(crate) approval: Option<ApprovalHandle>,
}

impl ToolCallEvent {
    /// Create an unattached tool call record.
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
            approval: None,
        }
    }

    /// Deliver the consumer's verdict for this call to its approval gate.
    ///
    /// At most one verdict per call is delivered; later calls (on this value
    /// or any clone) are no-ops, as is resolving an unattached call. Must be
    /// called from within a tokio runtime.
    pub fn resolve(&self, accepted: bool) {
        if let Some(handle) = &self.approval {
            handle.deliver(Verdict {
                accepted,
                call: self.clone(),
            });
        }
    }
}

impl std::fmt::Debug for ToolCallEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallEvent")
            .field("call_id", &self.call_id)
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}

impl PartialEq for ToolCallEvent {
    fn eq(&self, other: &Self) -> bool {
        self.call_id == other.call_id
            && self.name == other.name
            && self.arguments == other.arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ChatEvent::token("hi").kind(), EventKind::Token);
        assert_eq!(
            ChatEvent::tool_call("c1", "search", "{}").kind(),
            EventKind::ToolCall
        );
        assert_eq!(ChatEvent::refusal("no").kind(), EventKind::Refusal);
        assert_eq!(ChatEvent::user("u").kind(), EventKind::UserMessage);
        assert_eq!(ChatEvent::assistant("a").kind(), EventKind::AssistantMessage);
        assert_eq!(ChatEvent::system("s").kind(), EventKind::SystemMessage);
        assert_eq!(
            ChatEvent::tool_message("c1", "ok", true).kind(),
            EventKind::ToolMessage
        );
        assert_eq!(
            ChatEvent::error(ChatError::StreamingUnavailable).kind(),
            EventKind::Error
        );
        assert_eq!(ChatEvent::CompletionEnded.kind(), EventKind::CompletionEnded);
    }

    #[test]
    fn tool_call_equality_ignores_approval_handle() {
        let a = ToolCallEvent::new("c1", "search", "{}");
        let b = ToolCallEvent::new("c1", "search", "{}");
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_on_unattached_call_is_noop() {
        let call = ToolCallEvent::new("c1", "search", "{}");
        call.resolve(true);
        call.resolve(false);
    }
}
