//! Per-round approval rendezvous for pending tool calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::types::ToolCallEvent;

const VERDICT_BUFFER: usize = 16;

/// The consumer's accept/decline decision for a single tool call.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub accepted: bool,
    /// The tool call this verdict is for.
    pub call: ToolCallEvent,
}

/// A rendezvous that collects consumer verdicts for the tool calls of one
/// completion round.
///
/// The orchestrator creates a fresh gate per round, attaches every
/// reassembled tool call to it, and then waits for exactly as many verdicts
/// as there are calls. A gate is discarded after its round resolves or
/// cancellation fires.
pub struct ApprovalGate {
    tx: mpsc::Sender<Verdict>,
    rx: mpsc::Receiver<Verdict>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(VERDICT_BUFFER);
        Self { tx, rx }
    }

    /// Wire a tool call's `resolve` to this gate.
    pub fn attach(&self, call: &mut ToolCallEvent) {
        call.approval = Some(ApprovalHandle {
            tx: self.tx.clone(),
            resolved: Arc::new(AtomicBool::new(false)),
        });
    }

    /// Consume the gate and return a finite stream of up to `amount`
    /// verdicts in arrival order.
    ///
    /// An `amount` of zero terminates immediately. Cancellation closes the
    /// stream early; verdicts already yielded are unaffected. Verdicts
    /// resolved after the stream is dropped are discarded.
    pub fn wait(
        self,
        cancel: CancellationToken,
        amount: usize,
    ) -> impl Stream<Item = Verdict> {
        let Self { tx, rx } = self;
        drop(tx);
        stream::unfold(
            (rx, amount, cancel),
            |(mut rx, remaining, cancel)| async move {
                if remaining == 0 {
                    return None;
                }
                let verdict = tokio::select! {
                    _ = cancel.cancelled() => None,
                    verdict = rx.recv() => verdict,
                };
                verdict.map(|verdict| (verdict, (rx, remaining - 1, cancel)))
            },
        )
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate").finish_non_exhaustive()
    }
}

/// Routes a single call's verdict to its owning gate. Shared by all clones
/// of the attached [`ToolCallEvent`].
#[derive(Clone)]
pub(crate) struct ApprovalHandle {
    tx: mpsc::Sender<Verdict>,
    resolved: Arc<AtomicBool>,
}

impl ApprovalHandle {
    /// Deliver a verdict without ever blocking the caller: try a
    /// non-blocking send first and fall back to an async task. At most one
    /// verdict per handle is delivered.
    pub(crate) fn deliver(&self, verdict: Verdict) {
        if self.resolved.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.tx.try_send(verdict) {
            Ok(()) => {}
            Err(TrySendError::Full(verdict)) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(verdict).await;
                });
            }
            // The round is over and the wait stream is gone; the verdict
            // has no recipient.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
