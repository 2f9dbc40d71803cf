// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection management for one channel subscription.
//!
//! [`ConnectionManager`] owns the connection state machine, its timers and
//! the live transport. It runs as a single task ([`ConnectionManager::run`])
//! that waits on everything it owns at once: commands from
//! [`ConnectionHandle`]s, the pending open, frames from the live transport,
//! connectivity changes, the open watchdog, the backoff timer and the
//! maintenance sweep. Timers are stored on the manager, so dropping them is
//! all it takes to cancel them.
//!
//! Handles are cheap to clone and read the current state through
//! [`SharedConnectionState`] without a round trip to the task.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;

use sluice_core::{
    parse_frame, BackoffPolicy, ClockSource, ConflictStrategy, ConnectionState, Error, ErrorReport,
    Event, EventIdGenerator, EventQueue, EventType, Frame, KeyValueStore, ResumeTokenStore,
    Result, SnapshotCache, SystemClock, DEFAULT_SNAPSHOT_TTL,
};

use crate::maintenance::Maintenance;
use crate::sync::{SnapshotSource, SyncCoordinator, SyncOutcome};
use crate::transport::{subscription_url, Connector, Transport, TransportResult};

/// Callback receiving delivered events.
pub type EventCallback = Box<dyn FnMut(&Event) + Send>;
/// Callback receiving `(new, old)` on every state transition.
pub type StateCallback = Box<dyn FnMut(ConnectionState, ConnectionState) + Send>;
/// Callback receiving every reported error.
pub type ErrorCallback = Box<dyn FnMut(&ErrorReport) + Send>;
/// Callback receiving the result of each snapshot reconciliation.
pub type SyncCallback = Box<dyn FnMut(&SyncOutcome) + Send>;

/// Caller-supplied callbacks. All are optional.
#[derive(Default)]
pub struct Handlers {
    on_event: Option<EventCallback>,
    on_state_change: Option<StateCallback>,
    on_error: Option<ErrorCallback>,
    on_sync: Option<SyncCallback>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event consumer.
    pub fn on_event(mut self, f: impl FnMut(&Event) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(f));
        self
    }

    pub fn on_state_change(
        mut self,
        f: impl FnMut(ConnectionState, ConnectionState) + Send + 'static,
    ) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&ErrorReport) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_sync(mut self, f: impl FnMut(&SyncOutcome) + Send + 'static) -> Self {
        self.on_sync = Some(Box::new(f));
        self
    }

    fn has_consumer(&self) -> bool {
        self.on_event.is_some()
    }

    fn emit_event(&mut self, event: &Event) {
        if let Some(f) = self.on_event.as_mut() {
            f(event);
        }
    }

    fn emit_state(&mut self, new: ConnectionState, old: ConnectionState) {
        if let Some(f) = self.on_state_change.as_mut() {
            f(new, old);
        }
    }

    fn emit_error(&mut self, report: &ErrorReport) {
        if let Some(f) = self.on_error.as_mut() {
            f(report);
        }
    }

    fn emit_sync(&mut self, outcome: &SyncOutcome) {
        if let Some(f) = self.on_sync.as_mut() {
            f(outcome);
        }
    }
}

/// Connection state visible to both the manager task and its handles.
///
/// Uses atomic fields for lock-free reads.
pub struct SharedConnectionState {
    state: AtomicU8,
    attempt: AtomicU32,
    last_event_id: Mutex<Option<String>>,
}

impl SharedConnectionState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected.to_u8()),
            attempt: AtomicU32::new(0),
            last_event_id: Mutex::new(None),
        }
    }

    /// Get the current state.
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
            .unwrap_or(ConnectionState::Disconnected)
    }

    fn set(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Get the number of reconnects scheduled since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    /// Id of the most recently processed event.
    pub fn last_event_id(&self) -> Option<String> {
        self.last_event_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_last_event_id(&self, id: Option<String>) {
        let mut guard = self.last_event_id.lock().unwrap_or_else(|e| e.into_inner());
        *guard = id;
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    /// Get a human-readable status string.
    pub fn status_string(&self) -> String {
        match self.get() {
            ConnectionState::Reconnecting => format!("reconnecting (attempt {})", self.attempt()),
            state => state.to_string(),
        }
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for one connection manager.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base subscription URL.
    pub url: String,
    /// Channel to subscribe to.
    pub channel_key: String,
    /// Reconnect timing.
    pub backoff: BackoffPolicy,
    /// How long an open may take before it counts as a timeout.
    pub connect_timeout: Duration,
    /// How long synced queue entries are kept.
    pub retention: Duration,
    /// Period of the maintenance sweep.
    pub maintenance_interval: Duration,
    /// Lifetime of a cached snapshot.
    pub snapshot_ttl: Duration,
    /// Upper bound on a snapshot fetch.
    pub snapshot_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:7890/events".to_string(),
            channel_key: "default".to_string(),
            backoff: BackoffPolicy::default(),
            connect_timeout: Duration::from_secs(5),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            maintenance_interval: Duration::from_secs(24 * 60 * 60),
            snapshot_ttl: DEFAULT_SNAPSHOT_TTL,
            snapshot_timeout: Duration::from_secs(10),
        }
    }
}

/// Requests sent from handles to the manager task.
enum Command {
    Connect,
    Disconnect,
    Reconnect,
    AttachConsumer(EventCallback),
}

/// Cloneable control surface for a running [`ConnectionManager`].
#[derive(Clone)]
pub struct ConnectionHandle {
    channel_key: Arc<str>,
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<SharedConnectionState>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn channel_key(&self) -> &str {
        &self.channel_key
    }

    /// Starts connecting. A no-op unless disconnected.
    pub fn connect(&self) -> Result<()> {
        self.send(Command::Connect)
    }

    /// Closes the transport and cancels every pending timer.
    pub fn disconnect(&self) -> Result<()> {
        self.send(Command::Disconnect)
    }

    /// Connects from `failed` or `disconnected` with the retry counter reset.
    pub fn reconnect(&self) -> Result<()> {
        self.send(Command::Reconnect)
    }

    /// Installs the event consumer and flushes anything queued for it.
    pub fn attach_consumer(&self, f: impl FnMut(&Event) + Send + 'static) -> Result<()> {
        self.send(Command::AttachConsumer(Box::new(f)))
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.get()
    }

    pub fn last_event_id(&self) -> Option<String> {
        self.shared.last_event_id()
    }

    pub fn retry_attempt(&self) -> u32 {
        self.shared.attempt()
    }

    pub fn status_string(&self) -> String {
        self.shared.status_string()
    }

    /// Stops the manager task. It disconnects before returning.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the manager task has been asked to stop.
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ManagerStopped)
    }
}

type PendingOpen = BoxFuture<'static, TransportResult<Box<dyn Transport>>>;

/// Builder for [`ConnectionManager`].
pub struct ManagerBuilder<C: Connector> {
    config: ConnectionConfig,
    connector: C,
    store: Arc<dyn KeyValueStore>,
    handlers: Handlers,
    clock: Arc<dyn ClockSource>,
    online: Option<watch::Receiver<bool>>,
    snapshot_source: Option<Arc<dyn SnapshotSource>>,
    strategy: ConflictStrategy,
}

impl<C: Connector> ManagerBuilder<C> {
    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Online/offline signal. Without one the client assumes it is online.
    pub fn connectivity(mut self, online: watch::Receiver<bool>) -> Self {
        self.online = Some(online);
        self
    }

    /// Source of fresh snapshots for reconnect-time reconciliation.
    pub fn snapshot_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.snapshot_source = Some(source);
        self
    }

    pub fn conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Restores the channel's resume token and queue, and returns the
    /// manager together with its first handle.
    ///
    /// Storage failures here are reported and the manager starts with no
    /// token and an empty in-memory queue.
    pub async fn build(self) -> (ConnectionManager<C>, ConnectionHandle) {
        let ManagerBuilder {
            config,
            connector,
            store,
            mut handlers,
            clock,
            online,
            snapshot_source,
            strategy,
        } = self;
        let channel = config.channel_key.clone();

        let resume = ResumeTokenStore::new(Arc::clone(&store), Arc::clone(&clock));
        let last_event_id = match resume.load(&channel).await {
            Ok(token) => token.map(|t| t.last_event_id),
            Err(e) => {
                tracing::warn!(channel = %channel, "could not restore resume token: {e}");
                handlers.emit_error(&e.report(clock.now_ms()));
                None
            }
        };

        let queue = match EventQueue::open(Arc::clone(&store), Arc::clone(&clock), &channel).await
        {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!(channel = %channel, "could not open event queue: {e}");
                handlers.emit_error(&e.report(clock.now_ms()));
                EventQueue::detached(Arc::clone(&store), Arc::clone(&clock), &channel)
            }
        };

        let cache = SnapshotCache::new(Arc::clone(&store), Arc::clone(&clock), config.snapshot_ttl);
        let mut sync = SyncCoordinator::new(cache)
            .with_strategy(strategy)
            .with_fetch_timeout(config.snapshot_timeout);
        if let Some(source) = snapshot_source {
            sync = sync.with_source(source);
        }

        let shared = Arc::new(SharedConnectionState::new());
        shared.set_last_event_id(last_event_id.clone());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let period = config.maintenance_interval.max(Duration::from_millis(1));
        let mut sweep_timer = tokio::time::interval_at(Instant::now() + period, period);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let is_online = online.as_ref().map_or(true, |rx| *rx.borrow());

        let handle = ConnectionHandle {
            channel_key: Arc::from(channel.as_str()),
            commands: command_tx,
            shared: Arc::clone(&shared),
            cancel: cancel.clone(),
        };

        let manager = ConnectionManager {
            maintenance: Maintenance::new(config.retention),
            config,
            connector,
            clock,
            shared,
            state: ConnectionState::Disconnected,
            attempt: 0,
            resume,
            last_event_id,
            queue,
            sync,
            ids: EventIdGenerator::new(),
            handlers,
            online,
            is_online,
            commands: command_rx,
            cancel,
            opening: None,
            transport: None,
            watchdog: None,
            retry_timer: None,
            sweep_timer,
            has_connected: false,
        };

        (manager, handle)
    }
}

/// Owns the subscription for one channel.
pub struct ConnectionManager<C: Connector> {
    config: ConnectionConfig,
    connector: C,
    clock: Arc<dyn ClockSource>,
    shared: Arc<SharedConnectionState>,
    state: ConnectionState,
    /// Reconnects scheduled since the last successful open.
    attempt: u32,
    resume: ResumeTokenStore,
    last_event_id: Option<String>,
    queue: EventQueue,
    sync: SyncCoordinator,
    maintenance: Maintenance,
    ids: EventIdGenerator,
    handlers: Handlers,
    online: Option<watch::Receiver<bool>>,
    is_online: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
    opening: Option<PendingOpen>,
    transport: Option<Box<dyn Transport>>,
    watchdog: Option<Pin<Box<Sleep>>>,
    retry_timer: Option<Pin<Box<Sleep>>>,
    sweep_timer: Interval,
    /// Set after the first successful open.
    has_connected: bool,
}

impl<C: Connector> ConnectionManager<C> {
    /// Starts building a manager for `config.channel_key`.
    pub fn builder(
        config: ConnectionConfig,
        connector: C,
        store: Arc<dyn KeyValueStore>,
    ) -> ManagerBuilder<C> {
        ManagerBuilder {
            config,
            connector,
            store,
            handlers: Handlers::default(),
            clock: Arc::new(SystemClock),
            online: None,
            snapshot_source: None,
            strategy: ConflictStrategy::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Runs the event loop until the handle is shut down or every handle
    /// has been dropped.
    pub async fn run(mut self) {
        tracing::debug!(channel = %self.config.channel_key, "connection manager started");
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                result = poll_opening(&mut self.opening) => {
                    self.opening = None;
                    self.handle_open(result).await;
                }
                frame = recv_frame(&mut self.transport) => self.handle_recv(frame).await,
                online = wait_online(&mut self.online) => self.handle_connectivity(online).await,
                () = fire(&mut self.watchdog) => {
                    self.watchdog = None;
                    self.handle_timeout().await;
                }
                () = fire(&mut self.retry_timer) => {
                    self.retry_timer = None;
                    self.handle_retry_timer().await;
                }
                _ = self.sweep_timer.tick() => self.run_sweep().await,
            }
        }

        self.disconnect().await;
        tracing::debug!(channel = %self.config.channel_key, "connection manager stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => self.connect().await,
            Command::Disconnect => self.disconnect().await,
            Command::Reconnect => self.reconnect().await,
            Command::AttachConsumer(f) => {
                self.handlers.on_event = Some(f);
                self.flush_pending().await;
            }
        }
    }

    async fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!(channel = %self.config.channel_key, state = %self.state, "connect ignored");
            return;
        }
        self.start_attempt().await;
    }

    async fn reconnect(&mut self) {
        if !matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            tracing::debug!(channel = %self.config.channel_key, state = %self.state, "reconnect ignored");
            return;
        }
        tracing::info!(channel = %self.config.channel_key, "manual reconnect");
        self.set_attempt(0);
        self.start_attempt().await;
    }

    async fn disconnect(&mut self) {
        self.watchdog = None;
        self.retry_timer = None;
        self.opening = None;
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                tracing::debug!(channel = %self.config.channel_key, "close failed: {e}");
            }
        }

        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        ) {
            self.transition(ConnectionState::Disconnected);
            tracing::info!(channel = %self.config.channel_key, "disconnected");
        }
    }

    /// Enters `connecting`, opens the transport and arms the watchdog.
    async fn start_attempt(&mut self) {
        self.transition(ConnectionState::Connecting);

        let url = subscription_url(
            &self.config.url,
            &self.config.channel_key,
            self.last_event_id.as_deref(),
        );
        match url {
            Ok(url) => {
                tracing::info!(channel = %self.config.channel_key, attempt = self.attempt, "connecting to {url}");
                self.opening = Some(self.connector.open(&url));
                self.watchdog = Some(Box::pin(tokio::time::sleep(self.config.connect_timeout)));
            }
            Err(e) => self.handle_failure(e.into()).await,
        }
    }

    async fn handle_open(&mut self, result: TransportResult<Box<dyn Transport>>) {
        self.watchdog = None;
        match result {
            Ok(transport) => {
                self.transport = Some(transport);
                self.set_attempt(0);
                self.transition(ConnectionState::Connected);
                tracing::info!(channel = %self.config.channel_key, "connected");

                let reconnected = self.has_connected;
                self.has_connected = true;
                self.flush_pending().await;
                if reconnected {
                    self.reconcile().await;
                }
            }
            Err(e) => self.handle_failure(e.into()).await,
        }
    }

    async fn handle_timeout(&mut self) {
        self.opening = None;
        let ms = u64::try_from(self.config.connect_timeout.as_millis()).unwrap_or(u64::MAX);
        self.handle_failure(Error::Timeout(ms)).await;
    }

    async fn handle_retry_timer(&mut self) {
        if self.state == ConnectionState::Reconnecting {
            self.start_attempt().await;
        }
    }

    /// Moves through `error` to `reconnecting` or `failed`.
    async fn handle_failure(&mut self, error: Error) {
        let from = self.state;
        self.watchdog = None;
        self.opening = None;
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.close().await;
        }

        tracing::warn!(channel = %self.config.channel_key, "connection error: {error}");
        self.report(&error);
        self.transition(ConnectionState::Error);

        let failures = self.attempt.saturating_add(1);
        if from == ConnectionState::Connected || self.config.backoff.should_retry(failures) {
            let delay = self.config.backoff.delay(self.attempt);
            self.set_attempt(failures);
            tracing::info!(
                channel = %self.config.channel_key,
                attempt = self.attempt,
                "reconnecting in {} ms",
                delay.as_millis()
            );
            self.retry_timer = Some(Box::pin(tokio::time::sleep(delay)));
            self.transition(ConnectionState::Reconnecting);
        } else {
            self.transition(ConnectionState::Failed);
            let exhausted = Error::MaxRetriesExceeded { attempts: failures };
            tracing::error!(channel = %self.config.channel_key, "{exhausted}");
            self.report(&exhausted);
        }
    }

    async fn handle_recv(&mut self, frame: TransportResult<Option<String>>) {
        match frame {
            Ok(Some(text)) => self.handle_frame(&text).await,
            Ok(None) => {
                self.transport = None;
                self.handle_failure(Error::Transport("stream closed by server".to_string()))
                    .await;
            }
            Err(e) => {
                self.transport = None;
                self.handle_failure(e.into()).await;
            }
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        let now = self.clock.now_ms();
        match parse_frame(text, &self.config.channel_key, &self.ids, now) {
            Ok(Frame::Event(event)) => self.handle_event(event).await,
            Ok(Frame::Heartbeat) => {
                tracing::trace!(channel = %self.config.channel_key, "heartbeat");
            }
            Err(e) => {
                tracing::warn!(channel = %self.config.channel_key, "dropping frame: {e}");
                self.report(&e);
            }
        }
    }

    /// Records the resume token, then delivers or queues the event.
    async fn handle_event(&mut self, event: Event) {
        if let Err(e) = self.resume.record(&self.config.channel_key, &event.id).await {
            tracing::warn!(channel = %self.config.channel_key, event = %event.id, "resume token not persisted: {e}");
            self.report(&e);
        }
        self.last_event_id = Some(event.id.clone());
        self.shared.set_last_event_id(Some(event.id.clone()));

        if self.can_deliver() {
            self.flush_pending().await;
        }

        let wants_sync = event.event_type == EventType::SyncRequired;
        if self.can_deliver() && !self.queue.has_pending() {
            self.handlers.emit_event(&event);
        } else {
            tracing::debug!(channel = %self.config.channel_key, event = %event.id, "queueing event");
            if let Err(e) = self.queue.enqueue(event).await {
                tracing::warn!(channel = %self.config.channel_key, "queued event kept in memory only: {e}");
                self.report(&e);
            }
        }

        if wants_sync {
            self.reconcile().await;
        }
    }

    async fn handle_connectivity(&mut self, online: Option<bool>) {
        let Some(online) = online else {
            tracing::debug!(channel = %self.config.channel_key, "connectivity signal closed");
            self.online = None;
            return;
        };
        if online == self.is_online {
            return;
        }
        self.is_online = online;

        if online {
            tracing::info!(channel = %self.config.channel_key, "online");
            self.flush_pending().await;
            if self.state == ConnectionState::Reconnecting {
                self.retry_timer = None;
                self.start_attempt().await;
            }
        } else {
            tracing::info!(channel = %self.config.channel_key, "offline, queueing events");
        }
    }

    fn can_deliver(&self) -> bool {
        self.is_online && self.handlers.has_consumer()
    }

    /// Delivers queued events in receipt order.
    async fn flush_pending(&mut self) {
        if !self.can_deliver() || !self.queue.has_pending() {
            return;
        }

        let handlers = &mut self.handlers;
        let mut deliver = |event: &Event| handlers.emit_event(event);
        let flushed = self.sync.flush(&mut self.queue, &mut deliver).await;
        match flushed {
            Ok(0) => {}
            Ok(flushed) => {
                tracing::info!(channel = %self.config.channel_key, "flushed {flushed} queued events");
            }
            Err(e) => {
                tracing::warn!(channel = %self.config.channel_key, "queue flush failed: {e}");
                self.report(&e);
            }
        }
    }

    async fn reconcile(&mut self) {
        match self.sync.reconcile(&self.config.channel_key).await {
            Ok(outcome) => {
                tracing::debug!(channel = %self.config.channel_key, ?outcome, "snapshot reconciled");
                self.handlers.emit_sync(&outcome);
            }
            Err(e) => {
                tracing::warn!(channel = %self.config.channel_key, "snapshot reconciliation failed: {e}");
                self.report(&e);
            }
        }
    }

    async fn run_sweep(&mut self) {
        let report = self
            .maintenance
            .sweep(&mut self.queue, self.sync.cache())
            .await;
        tracing::info!(
            channel = %self.config.channel_key,
            events = report.events_purged,
            snapshots = report.snapshots_purged,
            "maintenance sweep"
        );
    }

    fn transition(&mut self, to: ConnectionState) {
        let from = self.state;
        match from.transition_to(to) {
            Ok(to) => {
                self.state = to;
                self.shared.set(to);
                tracing::debug!(channel = %self.config.channel_key, %from, %to, "state change");
                self.handlers.emit_state(to, from);
            }
            Err(e) => {
                tracing::error!(channel = %self.config.channel_key, "{e}");
            }
        }
    }

    fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
        self.shared.set_attempt(attempt);
    }

    fn report(&mut self, error: &Error) {
        let report = error.report(self.clock.now_ms());
        self.handlers.emit_error(&report);
    }
}

async fn poll_opening(opening: &mut Option<PendingOpen>) -> TransportResult<Box<dyn Transport>> {
    match opening {
        Some(open) => open.await,
        None => std::future::pending().await,
    }
}

async fn recv_frame(transport: &mut Option<Box<dyn Transport>>) -> TransportResult<Option<String>> {
    match transport {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_online(online: &mut Option<watch::Receiver<bool>>) -> Option<bool> {
    match online {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
