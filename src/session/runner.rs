//! The session orchestrator: reassembly, history flushing, approval gating
//! and tool dispatch across completion rounds.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::approval::ApprovalGate;
use crate::error::ChatError;
use crate::provider::ProviderAdapter;
use crate::session::{completion, Chat};
use crate::types::{ChatEvent, ToolCallEvent};

/// Text the model sees when the consumer declines a call.
const DECLINED_MESSAGE: &str = "User declined the tool call";

/// Drive completion rounds until a round produces no tool calls, a terminal
/// error occurs, or the token fires. Owns the outbound sender; dropping it
/// on return closes the consumer's channel exactly once.
pub(crate) async fn run_session(
    chat: Chat,
    cancel: CancellationToken,
    adapter: Arc<dyn ProviderAdapter>,
    out: mpsc::Sender<ChatEvent>,
) {
    let session_id = Uuid::new_v4();
    tracing::debug!(%session_id, "session started");

    let mut round = 0usize;
    loop {
        round += 1;
        let synced = adapter.sync_input(&chat);
        let mut inbound = completion::complete(cancel.clone(), synced);

        // Per-round accumulators. `assembling` marks the last element of
        // `calls` as the tool call still collecting argument fragments.
        let mut text = String::new();
        let mut calls: Vec<ToolCallEvent> = Vec::new();
        let mut assembling = false;
        let gate = ApprovalGate::new();
        let mut streaming_nil = false;
        let mut stream_failed = false;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%session_id, round, "session cancelled");
                    return;
                }
                event = inbound.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                ChatEvent::Token { text: chunk } => {
                    if !flush_pending(&out, &cancel, &calls, &mut assembling).await {
                        return;
                    }
                    text.push_str(&chunk);
                    if !forward(&out, &cancel, ChatEvent::Token { text: chunk }).await {
                        return;
                    }
                }
                ChatEvent::ToolCall(fragment) => {
                    // Skip-forward: a call is only emitted once complete.
                    if fragment.call_id.is_empty() {
                        match calls.last_mut() {
                            Some(open) if assembling => {
                                open.arguments.push_str(&fragment.arguments);
                            }
                            _ => tracing::warn!(
                                %session_id,
                                round,
                                "dropping tool-call fragment with no open call"
                            ),
                        }
                    } else {
                        if !flush_pending(&out, &cancel, &calls, &mut assembling).await {
                            return;
                        }
                        let mut call = fragment;
                        gate.attach(&mut call);
                        calls.push(call);
                        assembling = true;
                    }
                }
                ChatEvent::Refusal { text: refusal } => {
                    if !flush_pending(&out, &cancel, &calls, &mut assembling).await {
                        return;
                    }
                    chat.history()
                        .append(ChatEvent::Refusal { text: refusal.clone() });
                    if !forward(&out, &cancel, ChatEvent::Refusal { text: refusal }).await {
                        return;
                    }
                }
                ChatEvent::Error { error } => {
                    if matches!(error, ChatError::StreamingUnavailable) {
                        streaming_nil = true;
                    } else {
                        stream_failed = true;
                    }
                    if !forward(&out, &cancel, ChatEvent::Error { error }).await {
                        return;
                    }
                }
                event @ (ChatEvent::UserMessage { .. }
                | ChatEvent::AssistantMessage { .. }
                | ChatEvent::SystemMessage { .. }
                | ChatEvent::ToolMessage { .. }
                | ChatEvent::CompletionEnded) => {
                    if !flush_pending(&out, &cancel, &calls, &mut assembling).await {
                        return;
                    }
                    if !forward(&out, &cancel, event).await {
                        return;
                    }
                }
            }
        }

        // No streaming request was opened, so there is no round to flush.
        if streaming_nil {
            return;
        }

        if !text.is_empty() {
            chat.history().append(ChatEvent::AssistantMessage {
                text: std::mem::take(&mut text),
            });
        }
        for call in &calls {
            chat.history().append(ChatEvent::ToolCall(call.clone()));
        }
        if !flush_pending(&out, &cancel, &calls, &mut assembling).await {
            return;
        }
        if !forward(&out, &cancel, ChatEvent::CompletionEnded).await {
            return;
        }
        tracing::debug!(
            %session_id,
            round,
            tool_calls = calls.len(),
            failed = stream_failed,
            "round complete"
        );

        if stream_failed || calls.is_empty() {
            return;
        }

        // Gate on the consumer: exactly one verdict per reassembled call.
        let expected = calls.len();
        let verdicts = gate.wait(cancel.clone(), expected);
        tokio::pin!(verdicts);

        let mut processed = 0usize;
        while let Some(verdict) = verdicts.next().await {
            processed += 1;
            let call = &verdict.call;
            let (result, success) = if verdict.accepted {
                chat.tools().execute(&call.name, &call.arguments)
            } else {
                (DECLINED_MESSAGE.to_string(), false)
            };
            tracing::debug!(
                %session_id,
                round,
                call_id = %call.call_id,
                tool = %call.name,
                accepted = verdict.accepted,
                success,
                "tool call resolved"
            );
            chat.history()
                .append(ChatEvent::tool_message(call.call_id.clone(), result, success));
        }

        // The verdict stream only ends short on cancellation.
        if processed < expected {
            tracing::debug!(%session_id, round, "session cancelled awaiting approval");
            return;
        }
    }
}

/// Forward one event to the consumer, racing the cancellation token.
/// Returns false when the session should stop delivering.
async fn forward(
    out: &mpsc::Sender<ChatEvent>,
    cancel: &CancellationToken,
    event: ChatEvent,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = out.send(event) => sent.is_ok(),
    }
}

/// Emit the tool call currently being assembled, if any, and clear the slot.
async fn flush_pending(
    out: &mpsc::Sender<ChatEvent>,
    cancel: &CancellationToken,
    calls: &[ToolCallEvent],
    assembling: &mut bool,
) -> bool {
    if !*assembling {
        return true;
    }
    *assembling = false;
    match calls.last() {
        Some(call) => forward(out, cancel, ChatEvent::ToolCall(call.clone())).await,
        None => true,
    }
}
