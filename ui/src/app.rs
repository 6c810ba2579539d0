//! Root Application Component
//!
//! This module contains the App component that:
//! - Loads the configuration published by the page
//! - Builds the [`AppContext`] and mirrors it into Leptos signals
//! - Hooks page events (visibility, script errors, `data-confirm` links and
//!   forms, `data-copy` elements)
//! - Starts polling and the live channel

use std::rc::Rc;

use insight_shared::{Payload, RealtimeConfig};
use leptos::*;
use wasm_bindgen::prelude::*;
use web_sys::{Element, ErrorEvent, Event, HtmlFormElement};

use crate::components::{ActionBar, ConfirmDialog, ConnectionBadge, LoadingOverlay, ToastStack};
use crate::dom::BrowserDocument;
use crate::realtime::{RenderRegistry, RenderTarget, Visibility};
use crate::state::{AppContext, AppState, Platform};

/// Window property holding the configuration: an object, or a JSON or TOML string
const CONFIG_GLOBAL: &str = "INSIGHT_CONFIG";

/// Window property overriding the polling interval in milliseconds
const REFRESH_INTERVAL_GLOBAL: &str = "REFRESH_INTERVAL";

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    let ctx = AppContext::new(config.clone(), Platform::browser(&config));
    let app_state = AppState::bind(&ctx);
    provide_context(ctx.clone());
    provide_context(app_state);

    register_page_renderers(&ctx.registry);
    install_page_listeners(&ctx);
    ctx.start();

    view! {
        <ToastStack />
        <ConfirmDialog />
        <LoadingOverlay />
        <ConnectionBadge />
        <ActionBar />
    }
}

/// Build the configuration from page globals
///
/// Invalid values are logged and replaced by defaults.
pub fn resolve_config(raw: Option<&str>, refresh_interval: Option<f64>) -> RealtimeConfig {
    let config = match raw {
        Some(raw) => RealtimeConfig::parse(raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid {}: {}", CONFIG_GLOBAL, e);
            RealtimeConfig::default()
        }),
        None => RealtimeConfig::default(),
    };

    match refresh_interval {
        Some(ms) if ms.is_finite() && ms >= 1.0 && ms <= f64::from(u32::MAX) => {
            config.with_poll_interval(ms as u32)
        }
        Some(ms) => {
            tracing::warn!("Ignoring invalid {}: {}", REFRESH_INTERVAL_GLOBAL, ms);
            config
        }
        None => config,
    }
}

fn load_config() -> RealtimeConfig {
    let Some(window) = web_sys::window() else {
        return RealtimeConfig::default();
    };

    let raw = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
        .ok()
        .and_then(|value| {
            if value.is_string() {
                value.as_string()
            } else if value.is_object() {
                js_sys::JSON::stringify(&value).ok().map(String::from)
            } else {
                None
            }
        });
    let refresh_interval = js_sys::Reflect::get(&window, &JsValue::from_str(REFRESH_INTERVAL_GLOBAL))
        .ok()
        .and_then(|value| value.as_f64());

    let config = resolve_config(raw.as_deref(), refresh_interval);
    tracing::info!(
        "Config: base_path={}, poll_interval_ms={}, reconnect_delay_ms={}",
        config.base_path,
        config.poll_interval_ms,
        config.reconnect_delay_ms
    );
    config
}

/// Forward pushed snapshots to the chart functions the page defines
fn register_page_renderers(registry: &RenderRegistry) {
    registry.register(
        RenderTarget::Topology,
        Rc::new(|payload: &Payload| call_page_function("updateTopologyChart", payload)),
    );
    registry.register(
        RenderTarget::RecentTraces,
        Rc::new(|payload: &Payload| call_page_function("updateRecentTraces", payload)),
    );
}

/// Call `window[name](payload)` if the page defines it
fn call_page_function(name: &str, payload: &Payload) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(function) = js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .and_then(|value| value.dyn_into::<js_sys::Function>())
    else {
        tracing::debug!("Page does not define {}", name);
        return;
    };

    let result = js_sys::JSON::parse(&payload.to_string())
        .and_then(|argument| function.call1(&JsValue::NULL, &argument));
    if let Err(e) = result {
        tracing::error!("{} failed: {:?}", name, e);
    }
}

fn install_page_listeners(ctx: &AppContext) {
    let (Some(window), Some(document)) = (
        web_sys::window(),
        web_sys::window().and_then(|w| w.document()),
    ) else {
        tracing::warn!("No document; page listeners not installed");
        return;
    };

    // Visibility changes
    let visibility = ctx.visibility.clone();
    let on_visibility = Closure::<dyn FnMut()>::new(move || {
        visibility.set_visibility(Visibility::from_hidden(BrowserDocument::is_hidden()));
    });
    if let Err(e) = document
        .add_event_listener_with_callback("visibilitychange", on_visibility.as_ref().unchecked_ref())
    {
        tracing::error!("Failed to watch visibility: {:?}", e);
    }
    on_visibility.forget();

    // Uncaught script errors
    let error_ctx = ctx.clone();
    let on_error = Closure::<dyn FnMut(_)>::new(move |e: ErrorEvent| {
        error_ctx.report_page_error(&e.message());
    });
    if let Err(e) = window.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref()) {
        tracing::error!("Failed to watch script errors: {:?}", e);
    }
    on_error.forget();

    // Links asking for confirmation
    let click_ctx = ctx.clone();
    let on_click = Closure::<dyn FnMut(_)>::new(move |e: Event| {
        let Some(link) = e
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("a[data-confirm]").ok().flatten())
        else {
            return;
        };
        e.prevent_default();

        let message = link.get_attribute("data-confirm").unwrap_or_default();
        let href = link.get_attribute("href");
        let answer = click_ctx.notifications.confirm(message, None);
        spawn_local(async move {
            if !answer.await {
                return;
            }
            if let (Some(href), Some(window)) = (href, web_sys::window()) {
                if let Err(e) = window.location().set_href(&href) {
                    tracing::error!("Navigation failed: {:?}", e);
                }
            }
        });
    });
    if let Err(e) = document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref()) {
        tracing::error!("Failed to watch confirm links: {:?}", e);
    }
    on_click.forget();

    // Elements copying their `data-copy` value
    let copy_actions = ctx.actions.clone();
    let on_copy = Closure::<dyn FnMut(_)>::new(move |e: Event| {
        let Some(text) = e
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("[data-copy]").ok().flatten())
            .and_then(|el| el.get_attribute("data-copy"))
        else {
            return;
        };

        let actions = copy_actions.clone();
        spawn_local(async move {
            actions.copy_to_clipboard(&text).await;
        });
    });
    if let Err(e) = document.add_event_listener_with_callback("click", on_copy.as_ref().unchecked_ref()) {
        tracing::error!("Failed to watch copy buttons: {:?}", e);
    }
    on_copy.forget();

    // Forms asking for confirmation
    let submit_ctx = ctx.clone();
    let on_submit = Closure::<dyn FnMut(_)>::new(move |e: Event| {
        let Some(form) = e
            .target()
            .and_then(|target| target.dyn_into::<HtmlFormElement>().ok())
        else {
            return;
        };
        let Some(message) = form.get_attribute("data-confirm") else {
            return;
        };
        e.prevent_default();

        let answer = submit_ctx.notifications.confirm(message, Some("Confirm submit"));
        spawn_local(async move {
            if answer.await {
                if let Err(e) = form.submit() {
                    tracing::error!("Form submit failed: {:?}", e);
                }
            }
        });
    });
    if let Err(e) = document.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref()) {
        tracing::error!("Failed to watch confirm forms: {:?}", e);
    }
    on_submit.forget();
}
