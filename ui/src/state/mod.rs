//! Application State
//!
//! [`AppContext`] wires every component together once at startup and is
//! passed to whoever needs it; there is no ambient global. [`AppState`]
//! mirrors the parts the Leptos components render into signals.

use std::cell::RefCell;
use std::rc::Rc;

use insight_shared::RealtimeConfig;
use leptos::*;

use crate::actions::DashboardActions;
use crate::client::{GlooTransport, HttpTransport, InsightApi, LiveChannel, StompChannel};
use crate::dom::{BrowserDocument, PageHost, UiSurface};
use crate::loading::{LoadingTracker, GLOBAL_SCOPE};
use crate::notifications::{ConfirmPrompt, NotificationQueue, Severity, Toast};
use crate::realtime::{
    bind_status, ConnectionDeps, ConnectionManager, ConnectionState, RenderRegistry, UpdateDispatcher,
    VisibilityCoordinator,
};
use crate::runtime::{BrowserScheduler, Scheduler, TimerHandle};

/// Origin assumed when the page location is unavailable
const FALLBACK_ORIGIN: &str = "http://localhost:8080";

/// Message shown once the client is up
pub const WELCOME_MESSAGE: &str = "Spring Insight is ready";

/// Browser (or test) implementations of every seam
pub struct Platform {
    pub scheduler: Rc<dyn Scheduler>,
    pub transport: Rc<dyn HttpTransport>,
    pub channel: Rc<dyn LiveChannel>,
    pub surface: Rc<dyn UiSurface>,
    pub host: Rc<dyn PageHost>,
}

impl Platform {
    /// Platform backed by the current browser window
    pub fn browser(config: &RealtimeConfig) -> Self {
        let origin = BrowserDocument::origin().unwrap_or_else(|| FALLBACK_ORIGIN.to_string());
        let host = BrowserDocument::host().unwrap_or_else(|| "localhost".to_string());
        let ws_url = config.ws_url(&origin);
        tracing::debug!("Live channel endpoint: {}", ws_url);

        Self {
            scheduler: Rc::new(BrowserScheduler),
            transport: Rc::new(GlooTransport),
            channel: Rc::new(StompChannel::new(ws_url, host)),
            surface: Rc::new(BrowserDocument),
            host: Rc::new(BrowserDocument),
        }
    }
}

/// Every long-lived component of the client
#[derive(Clone)]
pub struct AppContext {
    pub config: Rc<RealtimeConfig>,
    pub scheduler: Rc<dyn Scheduler>,
    pub surface: Rc<dyn UiSurface>,
    pub notifications: NotificationQueue,
    pub loading: LoadingTracker,
    pub api: InsightApi,
    pub registry: RenderRegistry,
    pub dispatcher: UpdateDispatcher,
    pub connection: ConnectionManager,
    pub visibility: Rc<VisibilityCoordinator>,
    pub actions: DashboardActions,
    welcome: Rc<RefCell<Option<TimerHandle>>>,
}

impl AppContext {
    pub fn new(config: RealtimeConfig, platform: Platform) -> Self {
        let Platform {
            scheduler,
            transport,
            channel,
            surface,
            host,
        } = platform;

        let notifications = NotificationQueue::new(scheduler.clone(), config.toast_duration_ms);
        let loading = LoadingTracker::new();
        let api = InsightApi::new(&config, transport, loading.clone());
        let registry = RenderRegistry::new();
        let dispatcher = UpdateDispatcher::new(
            surface.clone(),
            registry.clone(),
            notifications.clone(),
            scheduler.clone(),
            config.highlight_ms,
            config.pulse_ms,
        );
        let connection = ConnectionManager::new(ConnectionDeps {
            channel,
            api: api.clone(),
            dispatcher: dispatcher.clone(),
            notifications: notifications.clone(),
            scheduler: scheduler.clone(),
            reconnect_delay_ms: config.reconnect_delay_ms,
            poll_interval_ms: config.poll_interval_ms,
        });
        let visibility = Rc::new(VisibilityCoordinator::new(connection.clone()));
        let actions = DashboardActions::new(connection.clone(), api.clone(), notifications.clone(), host);

        Self {
            config: Rc::new(config),
            scheduler,
            surface,
            notifications,
            loading,
            api,
            registry,
            dispatcher,
            connection,
            visibility,
            actions,
            welcome: Rc::new(RefCell::new(None)),
        }
    }

    /// Begin polling, open the live channel and greet the user
    pub fn start(&self) {
        tracing::info!("Starting real-time client");
        bind_status(&self.connection, self.surface.clone());

        self.connection.resume_polling();
        self.connection.start();

        let notifications = self.notifications.clone();
        let welcome = self.scheduler.timeout(
            self.config.welcome_delay_ms,
            Box::new(move || {
                notifications.toast(WELCOME_MESSAGE, Severity::Success);
            }),
        );
        *self.welcome.borrow_mut() = Some(welcome);
    }

    /// Report an uncaught page error to the user
    pub fn report_page_error(&self, message: &str) {
        tracing::error!("Uncaught page error: {}", message);
        self.notifications
            .toast(format!("Script error: {}", message), Severity::Error);
    }
}

/// Reactive mirror of the client state
#[derive(Clone, Copy)]
pub struct AppState {
    pub toasts: RwSignal<Vec<Toast>>,
    pub confirms: RwSignal<Vec<ConfirmPrompt>>,
    pub loading: RwSignal<bool>,
    pub connection: RwSignal<ConnectionState>,
}

impl AppState {
    /// Create signals for `ctx` and keep them updated
    pub fn bind(ctx: &AppContext) -> Self {
        let state = Self {
            toasts: create_rw_signal(ctx.notifications.toasts()),
            confirms: create_rw_signal(ctx.notifications.pending_confirms()),
            loading: create_rw_signal(ctx.loading.is_visible(GLOBAL_SCOPE)),
            connection: create_rw_signal(ctx.connection.state()),
        };

        let notifications = ctx.notifications.clone();
        ctx.notifications.on_change(Rc::new(move || {
            state.toasts.set(notifications.toasts());
            state.confirms.set(notifications.pending_confirms());
        }));

        ctx.loading.on_change(Rc::new(move |scope: &str, visible: bool| {
            if scope == GLOBAL_SCOPE {
                state.loading.set(visible);
            }
        }));

        ctx.connection
            .on_state_change(Rc::new(move |connection: ConnectionState| state.connection.set(connection)));

        state
    }
}
