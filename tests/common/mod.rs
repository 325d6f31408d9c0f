//! Shared test helpers: scripted provider adapters and stream drains.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use colloquy::error::ChatError;
use colloquy::provider::{EventStream, ProviderAdapter};
use colloquy::types::ChatEvent;
use colloquy::Chat;

/// One scripted completion round.
pub enum Round {
    /// Yield these events, then end (with a terminal error if given).
    Events(Vec<ChatEvent>, Option<ChatError>),
    /// `new_streaming` returns no stream at all.
    Nil,
    /// Yield these events, then stay open until cancellation.
    Hang(Vec<ChatEvent>),
}

impl Round {
    pub fn events(events: Vec<ChatEvent>) -> Self {
        Self::Events(events, None)
    }
}

/// A provider adapter replaying scripted rounds.
///
/// Rounds are consumed in order across `sync_input` copies (all copies share
/// the same script); once the script is exhausted every further round is an
/// immediately-ending empty stream. Each `sync_input` records the history
/// snapshot it was handed so tests can assert on re-snapshotting.
pub struct ScriptedAdapter {
    rounds: Arc<Mutex<VecDeque<Round>>>,
    streams_opened: Arc<AtomicUsize>,
    synced_histories: Arc<Mutex<Vec<Vec<ChatEvent>>>>,
}

impl ScriptedAdapter {
    pub fn new(rounds: Vec<Round>) -> Arc<Self> {
        Arc::new(Self {
            rounds: Arc::new(Mutex::new(rounds.into())),
            streams_opened: Arc::new(AtomicUsize::new(0)),
            synced_histories: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// How many streaming requests have been opened so far.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// The history snapshots observed by each `sync_input` call.
    pub fn synced_histories(&self) -> Vec<Vec<ChatEvent>> {
        self.synced_histories.lock().expect("sync log lock").clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn sync_input(&self, chat: &Chat) -> Box<dyn ProviderAdapter> {
        self.synced_histories
            .lock()
            .expect("sync log lock")
            .push(chat.history().snapshot());
        Box::new(Self {
            rounds: Arc::clone(&self.rounds),
            streams_opened: Arc::clone(&self.streams_opened),
            synced_histories: Arc::clone(&self.synced_histories),
        })
    }

    async fn new_streaming(&self, _cancel: CancellationToken) -> Option<EventStream> {
        let round = self.rounds.lock().expect("rounds lock").pop_front();
        let round = match round {
            Some(Round::Nil) => return None,
            Some(round) => round,
            None => Round::events(Vec::new()),
        };
        self.streams_opened.fetch_add(1, Ordering::SeqCst);

        match round {
            Round::Events(events, error) => {
                let items: Vec<Result<ChatEvent, ChatError>> =
                    events.into_iter().map(Ok).chain(error.map(Err)).collect();
                Some(Box::pin(stream::iter(items)))
            }
            Round::Hang(events) => Some(Box::pin(async_stream::stream! {
                for event in events {
                    yield Ok(event);
                }
                futures::future::pending::<()>().await;
            })),
            Round::Nil => unreachable!(),
        }
    }
}

/// Drain an outbound channel to closure without resolving anything.
pub async fn drain(mut rx: mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Drain an outbound channel, resolving every tool call with `accept`.
pub async fn drain_resolving(
    mut rx: mpsc::Receiver<ChatEvent>,
    accept: bool,
) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        if let ChatEvent::ToolCall(call) = &event {
            call.resolve(accept);
        }
        events.push(event);
    }
    events
}
