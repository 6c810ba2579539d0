//! Test doubles for the browser seams
//!
//! Deterministic stand-ins for the scheduler, HTTP transport, live channel,
//! page surface and page host, used by the unit tests of every module.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::client::{
    ApiError, ChannelError, ChannelEvent, ChannelListener, ExportFile, FrameHandler, HttpResponse,
    HttpTransport, LiveChannel,
};
use crate::dom::{HostError, PageHost, UiSurface};
use crate::runtime::{Scheduler, TimerHandle};

// ============================================================================
// Scheduler
// ============================================================================

enum Action {
    Once(Box<dyn FnOnce()>),
    Repeat(u64, Rc<RefCell<Box<dyn FnMut()>>>),
}

struct Task {
    id: u64,
    due: u64,
    action: Action,
}

#[derive(Default)]
struct Clock {
    now: u64,
    next_id: u64,
    tasks: Vec<Task>,
}

enum Due {
    Once(Box<dyn FnOnce()>),
    Repeat(Rc<RefCell<Box<dyn FnMut()>>>),
}

/// Scheduler driven by [`advance`](ManualScheduler::advance) instead of wall time
#[derive(Clone)]
pub struct ManualScheduler {
    clock: Rc<RefCell<Clock>>,
    pool: Rc<RefCell<LocalPool>>,
    spawner: LocalSpawner,
}

impl ManualScheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            clock: Rc::new(RefCell::new(Clock::default())),
            pool: Rc::new(RefCell::new(pool)),
            spawner,
        }
    }

    /// Milliseconds elapsed since creation
    pub fn now(&self) -> u64 {
        self.clock.borrow().now
    }

    /// Number of scheduled timers (one-shot and repeating)
    pub fn active_timers(&self) -> usize {
        self.clock.borrow().tasks.len()
    }

    /// Number of repeating timers
    pub fn active_intervals(&self) -> usize {
        self.clock
            .borrow()
            .tasks
            .iter()
            .filter(|task| matches!(task.action, Action::Repeat(..)))
            .count()
    }

    /// Run spawned futures until none can make progress
    pub fn run_pending(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward, firing due timers in order
    pub fn advance(&self, ms: u64) {
        let target = self.now() + ms;
        loop {
            self.run_pending();
            let Some(due) = self.pop_due(target) else {
                break;
            };
            match due {
                Due::Once(task) => task(),
                Due::Repeat(task) => {
                    let mut task = task.borrow_mut();
                    (*task)();
                }
            }
        }
        self.clock.borrow_mut().now = target;
        self.run_pending();
    }

    fn pop_due(&self, target: u64) -> Option<Due> {
        let mut clock = self.clock.borrow_mut();
        let index = clock
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= target)
            .min_by_key(|(_, task)| (task.due, task.id))
            .map(|(index, _)| index)?;

        clock.now = clock.tasks[index].due;
        if let Action::Repeat(period, task) = &clock.tasks[index].action {
            let task = task.clone();
            let period = *period;
            clock.tasks[index].due += period;
            return Some(Due::Repeat(task));
        }

        match clock.tasks.remove(index).action {
            Action::Once(task) => Some(Due::Once(task)),
            Action::Repeat(..) => None,
        }
    }

    fn schedule(&self, delay_ms: u32, action: Action) -> TimerHandle {
        let id = {
            let mut clock = self.clock.borrow_mut();
            let id = clock.next_id;
            clock.next_id += 1;
            let due = clock.now + u64::from(delay_ms);
            clock.tasks.push(Task { id, due, action });
            id
        };

        let clock = Rc::downgrade(&self.clock);
        TimerHandle::new(move || {
            if let Some(clock) = clock.upgrade() {
                let removed = {
                    let mut clock = clock.borrow_mut();
                    let index = clock.tasks.iter().position(|task| task.id == id);
                    index.map(|index| clock.tasks.remove(index))
                };
                drop(removed);
            }
        })
    }
}

impl Scheduler for ManualScheduler {
    fn timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerHandle {
        self.schedule(delay_ms, Action::Once(task))
    }

    fn interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle {
        let period = u64::from(period_ms.max(1));
        self.schedule(period_ms.max(1), Action::Repeat(period, Rc::new(RefCell::new(task))))
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(future) {
            panic!("failed to spawn test future: {}", e);
        }
    }
}

// ============================================================================
// HTTP transport
// ============================================================================

/// Transport answering from a fixed table; unknown URLs get a 404
#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<HashMap<String, Result<HttpResponse, ApiError>>>,
    log: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: Result<HttpResponse, ApiError>) {
        self.responses.borrow_mut().insert(url.to_string(), response);
    }

    /// Requests issued so far, as "METHOD url"
    pub fn requests(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn answer(&self, method: &str, url: &str) -> Result<HttpResponse, ApiError> {
        self.log.borrow_mut().push(format!("{} {}", method, url));
        self.responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::json(404, "")))
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.answer("GET", url)
    }

    async fn post(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.answer("POST", url)
    }
}

// ============================================================================
// Live channel
// ============================================================================

#[derive(Default)]
struct ChannelState {
    listener: Option<ChannelListener>,
    open: bool,
    connects: usize,
    disconnects: usize,
    subscriptions: Vec<(String, FrameHandler)>,
    sent: Vec<(String, String)>,
}

/// Channel whose handshake outcome and drops are triggered by the test
#[derive(Default)]
pub struct FakeChannel {
    state: RefCell<ChannelState>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn listener(&self) -> Option<ChannelListener> {
        self.state.borrow().listener.clone()
    }

    /// Complete the pending handshake
    pub fn accept(&self) {
        self.state.borrow_mut().open = true;
        if let Some(listener) = self.listener() {
            listener(ChannelEvent::Connected);
        }
    }

    /// Fail the pending handshake
    pub fn reject(&self, reason: &str) {
        if let Some(listener) = self.listener() {
            listener(ChannelEvent::Error(ChannelError::HandshakeFailed(reason.to_string())));
        }
    }

    /// Drop an established connection
    pub fn drop_connection(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.open = false;
            state.subscriptions.clear();
        }
        if let Some(listener) = self.listener() {
            listener(ChannelEvent::Error(ChannelError::Closed {
                code: 1006,
                reason: "abnormal closure".to_string(),
            }));
        }
    }

    /// Deliver `body` to the handler registered for `topic`
    pub fn deliver(&self, topic: &str, body: &str) -> bool {
        let handler = self
            .state
            .borrow()
            .subscriptions
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, handler)| handler.clone());
        match handler {
            Some(handler) => {
                handler(body);
                true
            }
            None => false,
        }
    }

    /// Listener of the current attempt, kept to replay late events
    pub fn current_listener(&self) -> Option<ChannelListener> {
        self.listener()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    /// Whether a connection attempt or connection is live
    pub fn is_active(&self) -> bool {
        self.state.borrow().listener.is_some()
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.borrow().disconnects
    }

    pub fn topics(&self) -> Vec<String> {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.borrow().sent.clone()
    }
}

impl LiveChannel for FakeChannel {
    fn connect(&self, listener: ChannelListener) {
        let mut state = self.state.borrow_mut();
        state.listener = Some(listener);
        state.open = false;
        state.connects += 1;
        state.subscriptions.clear();
    }

    fn subscribe(&self, topic: &str, handler: FrameHandler) -> Result<(), ChannelError> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(ChannelError::NotConnected);
        }
        state.subscriptions.push((topic.to_string(), handler));
        Ok(())
    }

    fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(ChannelError::NotConnected);
        }
        state.sent.push((destination.to_string(), body.to_string()));
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state.borrow_mut();
        state.listener = None;
        state.open = false;
        state.subscriptions.clear();
        state.disconnects += 1;
    }
}

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeElement {
    pub text: String,
    pub html: String,
    pub title: String,
    pub classes: BTreeSet<String>,
    /// Number of text/html writes
    pub writes: usize,
}

/// In-memory page with a fixed set of elements
#[derive(Default)]
pub struct FakeSurface {
    elements: RefCell<HashMap<String, FakeElement>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper adding an element with initial text
    pub fn with_element(self, id: &str, text: &str) -> Self {
        self.elements.borrow_mut().insert(
            id.to_string(),
            FakeElement {
                text: text.to_string(),
                ..FakeElement::default()
            },
        );
        self
    }

    pub fn element(&self, id: &str) -> Option<FakeElement> {
        self.elements.borrow().get(id).cloned()
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id)
            .map(|el| el.classes.contains(class))
            .unwrap_or(false)
    }

    fn with<R>(&self, id: &str, f: impl FnOnce(&mut FakeElement) -> R) -> Option<R> {
        self.elements.borrow_mut().get_mut(id).map(f)
    }
}

impl UiSurface for FakeSurface {
    fn text(&self, id: &str) -> Option<String> {
        self.element(id).map(|el| el.text.trim().to_string())
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        self.with(id, |el| {
            el.text = text.to_string();
            el.writes += 1;
        })
        .is_some()
    }

    fn set_html(&self, id: &str, html: &str) -> bool {
        self.with(id, |el| {
            el.html = html.to_string();
            el.writes += 1;
        })
        .is_some()
    }

    fn set_title(&self, id: &str, title: &str) -> bool {
        self.with(id, |el| el.title = title.to_string()).is_some()
    }

    fn add_class(&self, id: &str, class: &str) -> bool {
        self.with(id, |el| {
            el.classes.insert(class.to_string());
        })
        .is_some()
    }

    fn remove_class(&self, id: &str, class: &str) -> bool {
        self.with(id, |el| {
            el.classes.remove(class);
        })
        .is_some()
    }
}

/// Page host recording reloads and downloads
#[derive(Default)]
pub struct FakeHost {
    pub reloads: Cell<usize>,
    pub downloads: RefCell<Vec<ExportFile>>,
    pub clipboard: RefCell<Vec<String>>,
    /// Reject clipboard writes, as a browser without permission does
    pub deny_clipboard: Cell<bool>,
}

impl PageHost for FakeHost {
    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn download(&self, file: &ExportFile) -> Result<(), HostError> {
        self.downloads.borrow_mut().push(file.clone());
        Ok(())
    }

    fn copy_to_clipboard(&self, text: &str) -> LocalBoxFuture<'static, Result<(), HostError>> {
        let result = if self.deny_clipboard.get() {
            Err(HostError::Js("NotAllowedError".to_string()))
        } else {
            self.clipboard.borrow_mut().push(text.to_string());
            Ok(())
        };
        Box::pin(futures::future::ready(result))
    }
}
