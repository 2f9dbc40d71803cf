// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for client tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::future::{self, BoxFuture};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use sluice_core::{ConnectionState, ErrorReport, Event};

use crate::connection::Handlers;
use crate::transport::{Connector, Transport, TransportError, TransportResult};

/// What the next `open()` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Open {
    Accept,
    Refuse,
    /// Never resolves, so only the watchdog ends the attempt.
    Hang,
}

enum Incoming {
    Text(String),
    Fail(String),
    Close,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<Open>,
    urls: Vec<String>,
    live: Option<mpsc::UnboundedSender<Incoming>>,
    closed: usize,
}

/// Connector with a scripted sequence of open outcomes.
///
/// Opens not covered by the script are accepted. Frames pushed with
/// [`MockConnector::push`] go to the most recently opened transport.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, outcomes: impl IntoIterator<Item = Open>) {
        self.state.lock().unwrap().script.extend(outcomes);
    }

    pub fn refuse(&self, times: usize) {
        self.script(std::iter::repeat(Open::Refuse).take(times));
    }

    /// URLs passed to `open()`, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().urls.len()
    }

    /// Number of transports the client closed.
    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    fn send(&self, incoming: Incoming) -> bool {
        match &self.state.lock().unwrap().live {
            Some(tx) => tx.send(incoming).is_ok(),
            None => false,
        }
    }

    /// Sends a raw text frame on the live transport.
    pub fn push_text(&self, text: impl Into<String>) -> bool {
        self.send(Incoming::Text(text.into()))
    }

    /// Sends a JSON frame on the live transport.
    pub fn push(&self, frame: Value) -> bool {
        self.push_text(frame.to_string())
    }

    /// Makes the live transport fail its next receive.
    pub fn fail_transport(&self, message: &str) -> bool {
        self.send(Incoming::Fail(message.to_string()))
    }

    /// Ends the live stream as a server close would.
    pub fn close_transport(&self) -> bool {
        self.send(Incoming::Close)
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str) -> BoxFuture<'static, TransportResult<Box<dyn Transport>>> {
        let mut state = self.state.lock().unwrap();
        state.urls.push(url.to_string());
        let outcome = state.script.pop_front().unwrap_or(Open::Accept);

        let result: TransportResult<Box<dyn Transport>> = match outcome {
            Open::Accept => {
                let (tx, rx) = mpsc::unbounded_channel();
                state.live = Some(tx);
                Ok(Box::new(MockTransport {
                    incoming: rx,
                    state: Arc::clone(&self.state),
                }))
            }
            Open::Refuse => Err(TransportError::ConnectionFailed(
                "mock refusal".to_string(),
            )),
            Open::Hang => {
                return Box::pin(future::pending::<TransportResult<Box<dyn Transport>>>())
            }
        };
        Box::pin(future::ready(result))
    }
}

struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Incoming>,
    state: Arc<Mutex<MockState>>,
}

impl Transport for MockTransport {
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>> {
        Box::pin(async move {
            match self.incoming.recv().await {
                Some(Incoming::Text(text)) => Ok(Some(text)),
                Some(Incoming::Fail(message)) => Err(TransportError::ReceiveFailed(message)),
                Some(Incoming::Close) | None => Ok(None),
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        self.state.lock().unwrap().closed += 1;
        Box::pin(future::ready(Ok(())))
    }
}

/// An event frame as the server sends it.
pub fn event_frame(id: &str, channel: &str) -> Value {
    json!({
        "id": id,
        "type": "created",
        "timestamp": 1_700_000_000_000u64,
        "channelKey": channel,
        "payload": { "id": id },
    })
}

/// Everything a manager reported, collected through channels.
pub struct Recorder {
    pub events: mpsc::UnboundedReceiver<Event>,
    pub states: mpsc::UnboundedReceiver<(ConnectionState, ConnectionState)>,
    pub errors: mpsc::UnboundedReceiver<ErrorReport>,
}

impl Recorder {
    /// Handlers that forward into a new recorder.
    pub fn handlers(with_consumer: bool) -> (Handlers, Recorder) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (state_tx, states) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        let mut handlers = Handlers::new()
            .on_state_change(move |new, old| {
                let _ = state_tx.send((new, old));
            })
            .on_error(move |report| {
                let _ = error_tx.send(report.clone());
            });
        if with_consumer {
            handlers = handlers.on_event(move |event| {
                let _ = event_tx.send(event.clone());
            });
        }

        (
            handlers,
            Recorder {
                events,
                states,
                errors,
            },
        )
    }

    /// Waits for the manager to enter `target`, returning the states seen on
    /// the way.
    pub async fn wait_for(&mut self, target: ConnectionState) -> Vec<ConnectionState> {
        let mut seen = Vec::new();
        loop {
            let (new, _) = self.states.recv().await.unwrap();
            seen.push(new);
            if new == target {
                return seen;
            }
        }
    }

    /// Receives the next `n` events.
    pub async fn next_events(&mut self, n: usize) -> Vec<Event> {
        let mut events = Vec::with_capacity(n);
        for _ in 0..n {
            events.push(self.events.recv().await.unwrap());
        }
        events
    }

    pub fn drain_errors(&mut self) -> Vec<ErrorReport> {
        let mut errors = Vec::new();
        while let Ok(report) = self.errors.try_recv() {
            errors.push(report);
        }
        errors
    }
}

/// Event ids, for comparisons.
pub fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}
