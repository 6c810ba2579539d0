//! Render Callback Registry
//!
//! Chart and table rendering belongs to the host page. It registers one
//! callback per [`RenderTarget`]; the dispatcher forwards payloads to
//! whatever is registered and drops them otherwise.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use insight_shared::{MessageKind, Payload};

/// Views refreshed from pushed payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// Service dependency graph
    Topology,
    /// Recent traces table
    RecentTraces,
}

impl RenderTarget {
    /// Target fed by messages of `kind`, if any
    pub fn for_kind(kind: MessageKind) -> Option<Self> {
        match kind {
            MessageKind::TopologyUpdate => Some(RenderTarget::Topology),
            MessageKind::TracesUpdate => Some(RenderTarget::RecentTraces),
            MessageKind::StatsUpdate | MessageKind::ErrorAlert => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderTarget::Topology => "topology",
            RenderTarget::RecentTraces => "recent-traces",
        }
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback rendering a payload
pub type RenderFn = Rc<dyn Fn(&Payload)>;

/// Registry of render callbacks, shared between the host UI and the dispatcher
#[derive(Clone, Default)]
pub struct RenderRegistry {
    callbacks: Rc<RefCell<HashMap<RenderTarget, RenderFn>>>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `target`, replacing any previous one
    pub fn register(&self, target: RenderTarget, callback: RenderFn) {
        self.callbacks.borrow_mut().insert(target, callback);
    }

    /// Hand `payload` to the callback for `target`
    ///
    /// Returns false when nothing is registered.
    pub fn render(&self, target: RenderTarget, payload: &Payload) -> bool {
        let callback = self.callbacks.borrow().get(&target).cloned();
        match callback {
            Some(callback) => {
                callback(payload);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_render_without_callback_is_noop() {
        let registry = RenderRegistry::new();
        assert!(!registry.render(RenderTarget::Topology, &json!({})));
    }

    #[test]
    fn test_render_forwards_payload() {
        let registry = RenderRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            registry.register(
                RenderTarget::RecentTraces,
                Rc::new(move |payload| seen.borrow_mut().push(payload.clone())),
            );
        }

        assert!(registry.render(RenderTarget::RecentTraces, &json!([{"traceId": "t1"}])));
        assert!(!registry.render(RenderTarget::Topology, &json!([])));
        assert_eq!(*seen.borrow(), vec![json!([{"traceId": "t1"}])]);
    }

    #[test]
    fn test_callback_may_reregister() {
        let registry = RenderRegistry::new();
        let replaced = Rc::new(Cell::new(0));
        {
            let inner = registry.clone();
            let replaced = replaced.clone();
            registry.register(
                RenderTarget::Topology,
                Rc::new(move |_| {
                    let replaced = replaced.clone();
                    inner.register(
                        RenderTarget::Topology,
                        Rc::new(move |_| replaced.set(replaced.get() + 1)),
                    );
                }),
            );
        }

        assert!(registry.render(RenderTarget::Topology, &json!({})));
        assert_eq!(replaced.get(), 0);
        assert!(registry.render(RenderTarget::Topology, &json!({})));
        assert_eq!(replaced.get(), 1);
    }

    #[test]
    fn test_targets_for_kinds() {
        assert_eq!(RenderTarget::for_kind(MessageKind::TopologyUpdate), Some(RenderTarget::Topology));
        assert_eq!(RenderTarget::for_kind(MessageKind::TracesUpdate), Some(RenderTarget::RecentTraces));
        assert_eq!(RenderTarget::for_kind(MessageKind::StatsUpdate), None);
    }
}
