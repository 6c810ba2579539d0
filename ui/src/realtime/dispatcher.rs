//! Update Dispatcher
//!
//! Routes live messages to the page: stats go to the summary cards, topology
//! and trace snapshots go to the registered render callbacks, and error
//! alerts become toasts plus a bump of the error counter.
//!
//! Dispatch never suspends. Visual effects (highlight, pulse) are reverted by
//! scheduler timeouts; a new change on the same element restarts its effect.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use chrono::Local;
use insight_shared::{ErrorAlert, Message, MessageKind, Payload, StatsPayload};

use super::registry::{RenderRegistry, RenderTarget};
use crate::dom::UiSurface;
use crate::format::{format_count, format_date, format_running_hours, format_success_rate, parse_count};
use crate::notifications::{NotificationQueue, Severity};
use crate::runtime::{Scheduler, TimerHandle};

/// Element ids of the dashboard summary cards
pub const TOTAL_REQUESTS_ID: &str = "total-requests";
pub const TOTAL_SPANS_ID: &str = "total-spans";
pub const SUCCESS_RATE_ID: &str = "success-rate";
pub const RUNNING_HOURS_ID: &str = "running-hours";
pub const ERROR_COUNT_ID: &str = "error-count";

/// Class marking a value that just changed
pub const HIGHLIGHT_CLASS: &str = "value-updated";

/// Class animating the error counter
pub const PULSE_CLASS: &str = "pulse-animation";

struct DispatcherInner {
    surface: Rc<dyn UiSurface>,
    registry: RenderRegistry,
    notifications: NotificationQueue,
    scheduler: Rc<dyn Scheduler>,
    highlight_ms: u32,
    pulse_ms: u32,
    /// Pending effect reverts keyed by "<element>/<class>"
    effects: RefCell<HashMap<String, TimerHandle>>,
}

/// Routes messages to their handlers
#[derive(Clone)]
pub struct UpdateDispatcher {
    inner: Rc<DispatcherInner>,
}

impl UpdateDispatcher {
    pub fn new(
        surface: Rc<dyn UiSurface>,
        registry: RenderRegistry,
        notifications: NotificationQueue,
        scheduler: Rc<dyn Scheduler>,
        highlight_ms: u32,
        pulse_ms: u32,
    ) -> Self {
        Self {
            inner: Rc::new(DispatcherInner {
                surface,
                registry,
                notifications,
                scheduler,
                highlight_ms,
                pulse_ms,
                effects: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Handle one message
    pub fn dispatch(&self, message: &Message) {
        tracing::debug!("Dispatching {}", message.kind);

        match message.kind {
            MessageKind::StatsUpdate => self.update_stats(&message.data),
            MessageKind::TopologyUpdate | MessageKind::TracesUpdate => {
                if let Some(target) = RenderTarget::for_kind(message.kind) {
                    if !self.inner.registry.render(target, &message.data) {
                        tracing::debug!("No renderer registered for {}", target);
                    }
                }
            }
            MessageKind::ErrorAlert => self.raise_alert(&message.data),
        }
    }

    /// Parse and handle a body received on `topic`
    ///
    /// Malformed bodies and messages of a kind not published on `topic` are
    /// logged and dropped. Returns whether the message was dispatched.
    pub fn dispatch_raw(&self, topic: &str, body: &str) -> bool {
        let message = match Message::from_json(body) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping malformed message on {}: {}", topic, e);
                return false;
            }
        };

        if message.kind.topic() != topic {
            tracing::debug!("Dropping {} received on {}", message.kind, topic);
            return false;
        }

        self.dispatch(&message);
        true
    }

    fn update_stats(&self, data: &Payload) {
        let stats: StatsPayload = match serde_json::from_value(data.clone()) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Ignoring malformed stats payload: {}", e);
                return;
            }
        };
        let Some(collector) = stats.collector_stats else {
            return;
        };

        let values = [
            (TOTAL_REQUESTS_ID, collector.total_received_requests.as_ref().map(format_count)),
            (TOTAL_SPANS_ID, collector.total_received_spans.as_ref().map(format_count)),
            (SUCCESS_RATE_ID, collector.success_rate.map(format_success_rate)),
            (RUNNING_HOURS_ID, collector.running_hours.as_ref().map(format_running_hours)),
        ];

        for (id, value) in values {
            if let Some(value) = value {
                self.update_value(id, &value);
            }
        }
    }

    /// Write `value` into `id` if it differs from what is shown
    fn update_value(&self, id: &str, value: &str) {
        let surface = &self.inner.surface;
        let Some(current) = surface.text(id) else {
            return;
        };
        if current == value {
            return;
        }

        surface.set_text(id, value);
        self.flash(id, HIGHLIGHT_CLASS, self.inner.highlight_ms);
    }

    fn raise_alert(&self, data: &Payload) {
        let alert = ErrorAlert::from_payload(data);

        let severity = if alert.is_critical() {
            Severity::Error
        } else {
            Severity::Warning
        };
        match alert.raised_at() {
            Some(at) => tracing::warn!(
                "Error alert raised {}: {}",
                format_date(&at.with_timezone(&Local)),
                alert.summary()
            ),
            None => tracing::warn!("Error alert: {}", alert.summary()),
        }
        self.inner.notifications.toast(alert.summary(), severity);

        let surface = &self.inner.surface;
        if let Some(current) = surface.text(ERROR_COUNT_ID) {
            let count = parse_count(&current).saturating_add(1);
            surface.set_text(ERROR_COUNT_ID, &count.to_string());
            self.flash(ERROR_COUNT_ID, PULSE_CLASS, self.inner.pulse_ms);
        }
    }

    /// Add `class` to `id` and remove it after `duration_ms`
    fn flash(&self, id: &str, class: &str, duration_ms: u32) {
        let key = format!("{}/{}", id, class);

        let previous = self.inner.effects.borrow_mut().remove(&key);
        drop(previous);

        self.inner.surface.add_class(id, class);

        let weak: Weak<DispatcherInner> = Rc::downgrade(&self.inner);
        let (id, class, effect_key) = (id.to_string(), class.to_string(), key.clone());
        let revert = self.inner.scheduler.timeout(
            duration_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let fired = inner.effects.borrow_mut().remove(&effect_key);
                    drop(fired);
                    inner.surface.remove_class(&id, &class);
                }
            }),
        );
        self.inner.effects.borrow_mut().insert(key, revert);
    }
}
