//! Provider adapter contract.
//!
//! An adapter binds the abstract chat state to one concrete LLM provider:
//! it renders history and tool schemas into provider-native request
//! parameters and turns provider chunks back into [`ChatEvent`]s. The
//! orchestrator only ever talks to this trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::session::Chat;
use crate::types::ChatEvent;

/// One streaming completion: events in provider-emission order, an `Err`
/// item as the terminal iterator error, a clean `None` at end-of-stream.
/// Transport resources are released when the stream is dropped.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send>>;

/// Pluggable binding between a [`Chat`] and an LLM provider.
///
/// Implementations translate history into provider-native messages. The
/// expected mapping: assistant text and refusals become assistant messages
/// (refusals as refusal content parts), user/system map to their roles,
/// tool messages map to the provider's tool role keyed by call id, and tool
/// calls merge onto the nearest preceding assistant message (creating a
/// placeholder assistant with a single-space body when none exists).
/// Chunks that carry no events are skipped rather than surfaced.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Return an independent copy whose pending request parameters reflect
    /// the chat's current history snapshot and tool snapshot. Must not
    /// mutate `self`.
    fn sync_input(&self, chat: &Chat) -> Box<dyn ProviderAdapter>;

    /// Open one streaming completion request. `None` signals the adapter
    /// could not produce a stream; the session reports this as
    /// [`ChatError::StreamingUnavailable`]. The token covers the network
    /// read; implementations should stop reading once it fires.
    async fn new_streaming(&self, cancel: CancellationToken) -> Option<EventStream>;
}
