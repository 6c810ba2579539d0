//! Connection Manager
//!
//! Owns the live channel lifecycle and the fallback poller.
//!
//! ```text
//!   Disconnected --start()--> Connecting --handshake ok--> Connected
//!        ^                     |     ^                         |
//!        |              failure|     |retry timer         drop |
//!        |                     v     |                         |
//!        +-------stop()---- Reconnecting <---------------------+
//! ```
//!
//! `stop()` is valid from every state. Two timers are owned here and nowhere
//! else: the retry timer, which exists only while Reconnecting, and the poll
//! timer, which exists exactly while polling is enabled and the state is not
//! Connected.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use insight_shared::{Command, Message, MessageKind, COMMAND_DESTINATION};
use serde::{Deserialize, Serialize};

use super::dispatcher::UpdateDispatcher;
use crate::client::{ChannelError, ChannelEvent, InsightApi, LiveChannel};
use crate::notifications::{NotificationQueue, Severity};
use crate::runtime::{Scheduler, TimerHandle};

/// Live channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    /// Whether fresh data only arrives through polling in this state
    pub fn is_degraded(self) -> bool {
        self != ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives every state transition
pub type StateListener = Rc<dyn Fn(ConnectionState)>;

/// A topic registered on every successful connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub topic: &'static str,
    /// The only message kind accepted on `topic`
    pub kind: MessageKind,
}

/// Collaborators and timings of a [`ConnectionManager`]
pub struct ConnectionDeps {
    pub channel: Rc<dyn LiveChannel>,
    pub api: InsightApi,
    pub dispatcher: UpdateDispatcher,
    pub notifications: NotificationQueue,
    pub scheduler: Rc<dyn Scheduler>,
    pub reconnect_delay_ms: u32,
    pub poll_interval_ms: u32,
}

struct Shared {
    deps: ConnectionDeps,
    subscriptions: Vec<Subscription>,
    state: Cell<ConnectionState>,
    /// Bumped on every connect attempt and on teardown; events tagged with
    /// an older epoch are stale
    epoch: Cell<u64>,
    polling_enabled: Cell<bool>,
    retry: RefCell<Option<TimerHandle>>,
    poller: RefCell<Option<TimerHandle>>,
    listeners: RefCell<Vec<StateListener>>,
}

/// Handle to the connection lifecycle; clones share the same connection
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Rc<Shared>,
}

impl ConnectionManager {
    /// Create a manager in the Disconnected state with polling disabled
    pub fn new(deps: ConnectionDeps) -> Self {
        let subscriptions = MessageKind::ROUTES
            .iter()
            .map(|&(kind, topic)| Subscription { topic, kind })
            .collect();

        Self {
            shared: Rc::new(Shared {
                deps,
                subscriptions,
                state: Cell::new(ConnectionState::Disconnected),
                epoch: Cell::new(0),
                polling_enabled: Cell::new(false),
                retry: RefCell::new(None),
                poller: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    fn from_weak(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether the fallback poller is currently scheduled
    pub fn is_polling(&self) -> bool {
        self.shared.poller.borrow().is_some()
    }

    /// Whether a reconnect attempt is scheduled
    pub fn retry_pending(&self) -> bool {
        self.shared.retry.borrow().is_some()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.shared.subscriptions
    }

    /// Register a listener called after every state transition
    pub fn on_state_change(&self, listener: StateListener) {
        self.shared.listeners.borrow_mut().push(listener);
    }

    /// Open the live channel; a no-op unless Disconnected
    pub fn start(&self) {
        if self.state() != ConnectionState::Disconnected {
            tracing::debug!("start() ignored in state {}", self.state());
            return;
        }
        self.connect();
    }

    /// Close the live channel and cancel any pending reconnect
    ///
    /// Polling is left as configured by
    /// [`pause_polling`](Self::pause_polling)/[`resume_polling`](Self::resume_polling).
    pub fn stop(&self) {
        self.shared.epoch.set(self.shared.epoch.get() + 1);

        let retry = self.shared.retry.borrow_mut().take();
        drop(retry);

        if self.state() != ConnectionState::Disconnected {
            tracing::info!("Stopping real-time connection");
            self.shared.deps.channel.disconnect();
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Cancel the poll timer until [`resume_polling`](Self::resume_polling)
    pub fn pause_polling(&self) {
        self.shared.polling_enabled.set(false);
        self.sync_poller();
    }

    /// Poll whenever the channel is not Connected
    pub fn resume_polling(&self) {
        self.shared.polling_enabled.set(true);
        self.sync_poller();
    }

    /// Publish a command on the live channel
    pub fn send_command(&self, command: Command) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::NotConnected);
        }
        tracing::debug!("Sending command {:?}", command);
        self.shared
            .deps
            .channel
            .send(COMMAND_DESTINATION, &command.to_json())
    }

    fn connect(&self) {
        let epoch = self.shared.epoch.get() + 1;
        self.shared.epoch.set(epoch);
        self.set_state(ConnectionState::Connecting);

        let weak = Rc::downgrade(&self.shared);
        self.shared.deps.channel.connect(Rc::new(move |event: ChannelEvent| {
            if let Some(manager) = ConnectionManager::from_weak(&weak) {
                manager.on_event(epoch, event);
            }
        }));
    }

    fn on_event(&self, epoch: u64, event: ChannelEvent) {
        if epoch != self.shared.epoch.get() {
            tracing::debug!("Ignoring stale channel event {:?}", event);
            return;
        }

        match (self.state(), event) {
            (ConnectionState::Connecting, ChannelEvent::Connected) => self.on_connected(epoch),
            (ConnectionState::Connecting, ChannelEvent::Error(e)) => {
                tracing::error!("Real-time connection failed: {}", e);
                self.enter_reconnecting();
                self.shared.deps.notifications.toast(
                    format!(
                        "Real-time connection failed, retrying in {}s",
                        self.shared.deps.reconnect_delay_ms / 1000
                    ),
                    Severity::Error,
                );
            }
            (ConnectionState::Connected, ChannelEvent::Error(e)) => {
                tracing::warn!("Real-time connection lost: {}", e);
                self.enter_reconnecting();
                self.shared.deps.notifications.toast(
                    "Real-time connection lost, falling back to polling",
                    Severity::Warning,
                );
            }
            (state, event) => {
                tracing::debug!("Ignoring {:?} in state {}", event, state);
            }
        }
    }

    fn on_connected(&self, epoch: u64) {
        self.set_state(ConnectionState::Connected);

        let retry = self.shared.retry.borrow_mut().take();
        drop(retry);

        for subscription in &self.shared.subscriptions {
            let weak = Rc::downgrade(&self.shared);
            let topic = subscription.topic;
            let handler = Rc::new(move |body: &str| {
                let Some(manager) = ConnectionManager::from_weak(&weak) else {
                    return;
                };
                if manager.shared.epoch.get() != epoch {
                    tracing::debug!("Ignoring message from a closed connection on {}", topic);
                    return;
                }
                manager.shared.deps.dispatcher.dispatch_raw(topic, body);
            });

            if let Err(e) = self.shared.deps.channel.subscribe(topic, handler) {
                tracing::warn!("Failed to subscribe to {}: {}", topic, e);
            }
        }

        tracing::info!("Real-time connection established");
        self.shared
            .deps
            .notifications
            .toast("Real-time connection established", Severity::Success);
    }

    /// Tear down the failed attempt, fall back to polling and schedule a retry
    fn enter_reconnecting(&self) {
        self.shared.epoch.set(self.shared.epoch.get() + 1);
        self.set_state(ConnectionState::Reconnecting);
        self.shared.deps.channel.disconnect();
        self.schedule_retry();
    }

    fn schedule_retry(&self) {
        let previous = self.shared.retry.borrow_mut().take();
        drop(previous);

        let delay = self.shared.deps.reconnect_delay_ms;
        tracing::info!("Reconnecting in {}ms", delay);

        let weak = Rc::downgrade(&self.shared);
        let retry = self.shared.deps.scheduler.timeout(
            delay,
            Box::new(move || {
                if let Some(manager) = ConnectionManager::from_weak(&weak) {
                    manager.retry_now();
                }
            }),
        );
        *self.shared.retry.borrow_mut() = Some(retry);
    }

    fn retry_now(&self) {
        let fired = self.shared.retry.borrow_mut().take();
        drop(fired);

        if self.state() == ConnectionState::Reconnecting {
            self.connect();
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.shared.state.replace(state);
        if previous == state {
            return;
        }
        tracing::debug!("Connection state: {} -> {}", previous, state);

        self.sync_poller();

        let listeners = self.shared.listeners.borrow().clone();
        for listener in listeners {
            listener(state);
        }
    }

    /// Start or cancel the poll timer to match the current state
    fn sync_poller(&self) {
        let wanted = self.shared.polling_enabled.get() && self.state().is_degraded();
        let running = self.is_polling();

        if wanted && !running {
            let period = self.shared.deps.poll_interval_ms;
            tracing::debug!("Starting fallback polling every {}ms", period);

            let weak = Rc::downgrade(&self.shared);
            let poller = self.shared.deps.scheduler.interval(
                period,
                Box::new(move || {
                    if let Some(manager) = ConnectionManager::from_weak(&weak) {
                        manager.poll_once();
                    }
                }),
            );
            *self.shared.poller.borrow_mut() = Some(poller);
        } else if !wanted && running {
            tracing::debug!("Stopping fallback polling");
            let poller = self.shared.poller.borrow_mut().take();
            drop(poller);
        }
    }

    fn poll_once(&self) {
        let api = self.shared.deps.api.clone();
        let dispatcher = self.shared.deps.dispatcher.clone();

        self.shared.deps.scheduler.spawn(Box::pin(async move {
            match api.realtime_stats().await {
                Ok(data) => dispatcher.dispatch(&Message::stats(data)),
                Err(e) => tracing::error!("Polling update failed: {}", e),
            }
        }));
    }
}
