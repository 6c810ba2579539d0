//! Timers and Task Spawning
//!
//! Everything time-driven in the client (reconnect retries, the fallback
//! poller, toast expiry, highlight reverts) goes through [`Scheduler`], so
//! the browser event loop can be swapped for a manual clock in tests.

use futures::future::LocalBoxFuture;
use gloo_timers::callback::{Interval, Timeout};

/// Handle to a scheduled timer
///
/// Dropping the handle cancels the timer. A handle whose timer already fired
/// can be dropped safely.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    /// Create a handle that runs `cancel` when the timer is cancelled
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the timer
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Single-threaded scheduler for timers and local futures
pub trait Scheduler {
    /// Run `task` once after `delay_ms`
    fn timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerHandle;

    /// Run `task` every `period_ms` until the handle is dropped
    fn interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle;

    /// Drive a `!Send` future to completion on the current thread
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

/// Scheduler backed by the browser event loop
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerHandle {
        let timeout = Timeout::new(delay_ms, task);
        TimerHandle::new(move || drop(timeout))
    }

    fn interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle {
        let interval = Interval::new(period_ms, task);
        TimerHandle::new(move || drop(interval))
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
