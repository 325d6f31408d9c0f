//! Conversation history: an append-only, concurrency-safe event log.

use std::sync::{Mutex, PoisonError};

use crate::types::ChatEvent;

/// Ordered log of completed chat events.
///
/// The orchestrator only ever appends completed messages and terminal tool
/// call records here, never raw tokens or partial tool-call fragments.
/// Appends and snapshots are safe under concurrent producers.
#[derive(Debug, Default)]
pub struct History {
    events: Mutex<Vec<ChatEvent>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event to the log.
    pub fn append(&self, event: ChatEvent) {
        self.lock().push(event);
    }

    /// Return an independent copy of the log, in append order.
    pub fn snapshot(&self) -> Vec<ChatEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatEvent>> {
        // A poisoned lock only means a writer panicked mid-append; the log
        // itself is still a valid Vec.
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
