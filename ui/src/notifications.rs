//! Notification Queue
//!
//! Transient toasts and blocking-style confirmation prompts. The queue only
//! holds state; the Leptos layer renders it by registering an
//! [`on_change`](NotificationQueue::on_change) listener.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::runtime::{Scheduler, TimerHandle};

/// Title used when a confirmation does not provide one
pub const DEFAULT_CONFIRM_TITLE: &str = "Confirm action";

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toast identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(Uuid);

/// A transient user-visible message
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u32,
}

/// Confirmation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmId(Uuid);

/// A confirmation waiting for the user
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmPrompt {
    pub id: ConfirmId,
    pub title: String,
    pub message: String,
}

/// Ways a confirmation prompt can be closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// The confirm button
    Confirm,
    /// The cancel button
    Cancel,
    /// A click outside the dialog
    Backdrop,
    /// The Escape key
    Escape,
    /// The close button in the header
    Close,
}

impl ConfirmAction {
    /// Only the explicit confirm button counts as acceptance
    pub fn accepted(self) -> bool {
        matches!(self, ConfirmAction::Confirm)
    }
}

struct PendingConfirm {
    prompt: ConfirmPrompt,
    responder: oneshot::Sender<bool>,
}

struct QueueInner {
    scheduler: Rc<dyn Scheduler>,
    default_duration_ms: u32,
    toasts: RefCell<Vec<Toast>>,
    expiries: RefCell<HashMap<ToastId, TimerHandle>>,
    confirms: RefCell<Vec<PendingConfirm>>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

/// Queue of toasts and pending confirmations
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Rc<QueueInner>,
}

impl NotificationQueue {
    /// Create a queue whose toasts last `default_duration_ms` unless told otherwise
    pub fn new(scheduler: Rc<dyn Scheduler>, default_duration_ms: u32) -> Self {
        Self {
            inner: Rc::new(QueueInner {
                scheduler,
                default_duration_ms,
                toasts: RefCell::new(Vec::new()),
                expiries: RefCell::new(HashMap::new()),
                confirms: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a listener called after every change
    pub fn on_change(&self, listener: Rc<dyn Fn()>) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    /// Show a toast for the default duration
    pub fn toast(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.toast_for(message, severity, self.inner.default_duration_ms)
    }

    /// Show a toast that dismisses itself after `duration_ms`
    pub fn toast_for(&self, message: impl Into<String>, severity: Severity, duration_ms: u32) -> ToastId {
        let toast = Toast {
            id: ToastId(Uuid::new_v4()),
            message: message.into(),
            severity,
            duration_ms,
        };
        let id = toast.id;
        tracing::debug!("Toast [{}]: {}", severity, toast.message);

        self.inner.toasts.borrow_mut().push(toast);

        let weak: Weak<QueueInner> = Rc::downgrade(&self.inner);
        let expiry = self.inner.scheduler.timeout(
            duration_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    NotificationQueue { inner }.dismiss(id);
                }
            }),
        );
        self.inner.expiries.borrow_mut().insert(id, expiry);

        self.notify();
        id
    }

    /// Remove a toast; returns false if it was already gone
    pub fn dismiss(&self, id: ToastId) -> bool {
        let removed = {
            let mut toasts = self.inner.toasts.borrow_mut();
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            toasts.len() != before
        };
        let expiry = self.inner.expiries.borrow_mut().remove(&id);
        drop(expiry);

        if removed {
            self.notify();
        }
        removed
    }

    /// Currently visible toasts, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    /// Ask the user to confirm `message`
    ///
    /// Resolves to `true` only when the confirm action is taken; every other
    /// way of closing the prompt resolves to `false`.
    pub fn confirm(&self, message: impl Into<String>, title: Option<&str>) -> impl Future<Output = bool> + 'static {
        let (responder, answer) = oneshot::channel();
        let prompt = ConfirmPrompt {
            id: ConfirmId(Uuid::new_v4()),
            title: title.unwrap_or(DEFAULT_CONFIRM_TITLE).to_string(),
            message: message.into(),
        };

        self.inner
            .confirms
            .borrow_mut()
            .push(PendingConfirm { prompt, responder });
        self.notify();

        async move { answer.await.unwrap_or(false) }
    }

    /// Prompts waiting for an answer, oldest first
    pub fn pending_confirms(&self) -> Vec<ConfirmPrompt> {
        self.inner
            .confirms
            .borrow()
            .iter()
            .map(|pending| pending.prompt.clone())
            .collect()
    }

    /// Close a prompt; returns false if it was already answered
    pub fn resolve_confirm(&self, id: ConfirmId, action: ConfirmAction) -> bool {
        let pending = {
            let mut confirms = self.inner.confirms.borrow_mut();
            confirms
                .iter()
                .position(|pending| pending.prompt.id == id)
                .map(|index| confirms.remove(index))
        };

        let Some(pending) = pending else {
            return false;
        };

        // The asker may have stopped waiting
        let _ = pending.responder.send(action.accepted());
        self.notify();
        true
    }

    fn notify(&self) {
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}
