//! The `Chat` value and its consumer-facing entry points.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::history::History;
use crate::provider::ProviderAdapter;
use crate::session::runner;
use crate::session::EVENT_BUFFER;
use crate::tools::ToolRegistry;
use crate::types::{ChatEvent, Sender};

/// A conversation: its history and the tools the model may call.
///
/// `Chat` is cheap to clone; clones share the same history and registry.
/// Run one session at a time per chat instance: history writes interleave
/// with adapter snapshots, so concurrent sessions would observe each
/// other's partial rounds.
#[derive(Debug, Clone, Default)]
pub struct Chat {
    history: Arc<History>,
    tools: Arc<ToolRegistry>,
}

impl Chat {
    /// Create a chat with empty history and an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chat over existing history and tools.
    pub fn with_parts(history: Arc<History>, tools: Arc<ToolRegistry>) -> Self {
        Self { history, tools }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Append a text message from the given sender to the history.
    ///
    /// Only user, assistant and system senders translate into history
    /// events; tool and tool-caller senders fail with
    /// [`ChatError::UnsupportedSender`] (seed those through
    /// [`Self::append_event`] instead).
    pub fn add_message(&self, sender: Sender, text: impl Into<String>) -> Result<(), ChatError> {
        let event = match sender {
            Sender::User => ChatEvent::user(text),
            Sender::Assistant => ChatEvent::assistant(text),
            Sender::System => ChatEvent::system(text),
            Sender::Tool | Sender::ToolCaller { .. } => {
                return Err(ChatError::UnsupportedSender)
            }
        };
        self.history.append(event);
        Ok(())
    }

    /// Append an already-constructed event to the history.
    pub fn append_event(&self, event: ChatEvent) {
        self.history.append(event);
    }

    /// Start a session over the current history without adding new input.
    ///
    /// The returned channel yields the session's outbound events and closes
    /// after the final round's `CompletionEnded`, after a terminal error,
    /// or after cancellation.
    pub fn session(
        &self,
        cancel: CancellationToken,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(runner::run_session(self.clone(), cancel, adapter, tx));
        rx
    }

    /// Append a message from `sender` and start a session.
    ///
    /// An unsupported sender is reported as a single error event on the
    /// returned channel instead of a provider round.
    pub fn send_stream(
        &self,
        cancel: CancellationToken,
        adapter: Arc<dyn ProviderAdapter>,
        sender: Sender,
        text: impl Into<String>,
    ) -> mpsc::Receiver<ChatEvent> {
        if let Err(error) = self.add_message(sender, text) {
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(ChatEvent::error(error));
            return rx;
        }
        self.session(cancel, adapter)
    }

    /// Append a user message and start a session.
    pub fn send_user_stream(
        &self,
        cancel: CancellationToken,
        adapter: Arc<dyn ProviderAdapter>,
        text: impl Into<String>,
    ) -> mpsc::Receiver<ChatEvent> {
        self.send_stream(cancel, adapter, Sender::User, text)
    }

    /// Append an assistant message and start a session.
    pub fn send_assistant_stream(
        &self,
        cancel: CancellationToken,
        adapter: Arc<dyn ProviderAdapter>,
        text: impl Into<String>,
    ) -> mpsc::Receiver<ChatEvent> {
        self.send_stream(cancel, adapter, Sender::Assistant, text)
    }

    /// Append a system message and start a session.
    pub fn send_system_stream(
        &self,
        cancel: CancellationToken,
        adapter: Arc<dyn ProviderAdapter>,
        text: impl Into<String>,
    ) -> mpsc::Receiver<ChatEvent> {
        self.send_stream(cancel, adapter, Sender::System, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[test]
    fn add_message_translates_supported_senders() {
        let chat = Chat::new();
        chat.add_message(Sender::User, "hello").expect("user");
        chat.add_message(Sender::Assistant, "reply").expect("assistant");
        chat.add_message(Sender::System, "rules").expect("system");

        let events = chat.history().snapshot();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind(), EventKind::UserMessage);
        assert_eq!(events[1].kind(), EventKind::AssistantMessage);
        assert_eq!(events[2].kind(), EventKind::SystemMessage);
    }

    #[test]
    fn add_message_rejects_tool_senders() {
        let chat = Chat::new();

        let err = chat
            .add_message(Sender::Tool, "result")
            .expect_err("tool sender");
        assert_eq!(err, ChatError::UnsupportedSender);

        let err = chat
            .add_message(
                Sender::ToolCaller {
                    call_id: "c1".to_string(),
                    name: "search".to_string(),
                },
                "{}",
            )
            .expect_err("tool caller sender");
        assert_eq!(err, ChatError::UnsupportedSender);

        assert!(chat.history().is_empty());
    }

    #[test]
    fn append_event_accepts_seeded_tool_records() {
        let chat = Chat::new();
        chat.append_event(ChatEvent::tool_call("seed-1", "read_file", r#"{"path":"x"}"#));
        chat.append_event(ChatEvent::tool_message("seed-1", "contents", true));

        let events = chat.history().snapshot();
        assert_eq!(events[0].kind(), EventKind::ToolCall);
        assert_eq!(events[1].kind(), EventKind::ToolMessage);
    }
}
