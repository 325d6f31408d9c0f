//! Completion stage: a thin, cancellable forwarder for one streaming round.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::provider::ProviderAdapter;
use crate::types::ChatEvent;

/// Bounded capacity of the inbound and outbound event channels.
pub(crate) const EVENT_BUFFER: usize = 16;

/// Drain one streaming request from the adapter into a fresh channel.
///
/// The spawned task forwards provider events verbatim; reassembly and all
/// history bookkeeping happen in the orchestrator. A `None` stream becomes
/// a single streaming-nil error event; a terminal stream error becomes a
/// single error event. The channel closes on every exit path.
pub(crate) fn complete(
    cancel: CancellationToken,
    adapter: Box<dyn ProviderAdapter>,
) -> mpsc::Receiver<ChatEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        let stream = tokio::select! {
            _ = cancel.cancelled() => return,
            stream = adapter.new_streaming(cancel.clone()) => stream,
        };

        let Some(mut stream) = stream else {
            tracing::warn!("provider adapter returned no stream");
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tx.send(ChatEvent::error(ChatError::StreamingUnavailable)) => {}
            }
            return;
        };

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return,
                item = stream.next() => item,
            };

            match item {
                Some(Ok(event)) => {
                    let delivered = tokio::select! {
                        _ = cancel.cancelled() => false,
                        sent = tx.send(event) => sent.is_ok(),
                    };
                    if !delivered {
                        return;
                    }
                }
                Some(Err(error)) => {
                    tracing::warn!(%error, "provider stream failed");
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tx.send(ChatEvent::error(error)) => {}
                    }
                    return;
                }
                None => return,
            }
        }
    });

    rx
}
