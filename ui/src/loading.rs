//! Loading Indicator Tracker
//!
//! Reference-counted busy state per UI scope. The overlay for a scope is
//! shown when its count goes from 0 to 1 and hidden when it returns to 0.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Scope used when the caller does not name one
pub const GLOBAL_SCOPE: &str = "global";

/// Callback invoked with `(scope, visible)` on overlay transitions
pub type LoadingListener = Rc<dyn Fn(&str, bool)>;

#[derive(Default)]
struct TrackerState {
    counts: HashMap<String, usize>,
    listeners: Vec<LoadingListener>,
}

/// Tracks outstanding work per scope
#[derive(Clone, Default)]
pub struct LoadingTracker {
    state: Rc<RefCell<TrackerState>>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for overlay show/hide transitions
    pub fn on_change(&self, listener: LoadingListener) {
        self.state.borrow_mut().listeners.push(listener);
    }

    /// Mark one more unit of work in `scope`
    pub fn acquire(&self, scope: &str) {
        let shown = {
            let mut state = self.state.borrow_mut();
            let count = state.counts.entry(scope.to_string()).or_insert(0);
            *count += 1;
            *count == 1
        };

        if shown {
            self.notify(scope, true);
        }
    }

    /// Mark one unit of work in `scope` as finished
    ///
    /// Releasing a scope that is already idle is a no-op.
    pub fn release(&self, scope: &str) {
        let hidden = {
            let mut state = self.state.borrow_mut();
            let current = state.counts.get(scope).copied().unwrap_or(0);
            match current {
                0 => {
                    tracing::debug!("Ignoring release of idle loading scope '{}'", scope);
                    false
                }
                1 => {
                    state.counts.remove(scope);
                    true
                }
                n => {
                    state.counts.insert(scope.to_string(), n - 1);
                    false
                }
            }
        };

        if hidden {
            self.notify(scope, false);
        }
    }

    /// Acquire `scope` until the returned guard is dropped
    pub fn guard(&self, scope: &str) -> LoadingGuard {
        self.acquire(scope);
        LoadingGuard {
            tracker: self.clone(),
            scope: scope.to_string(),
        }
    }

    /// Current reference count of `scope`
    pub fn ref_count(&self, scope: &str) -> usize {
        self.state.borrow().counts.get(scope).copied().unwrap_or(0)
    }

    /// Whether the overlay for `scope` is visible
    pub fn is_visible(&self, scope: &str) -> bool {
        self.ref_count(scope) > 0
    }

    fn notify(&self, scope: &str, visible: bool) {
        let listeners = self.state.borrow().listeners.clone();
        for listener in listeners {
            listener(scope, visible);
        }
    }
}

/// Releases its scope when dropped
#[must_use = "the scope is released as soon as the guard is dropped"]
pub struct LoadingGuard {
    tracker: LoadingTracker,
    scope: String,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.scope);
    }
}
