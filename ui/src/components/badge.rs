//! Connection Badge
//!
//! Small floating indicator of the live channel state, for pages that do not
//! render their own `ws-status` element.

use leptos::*;

use crate::realtime::ConnectionState;
use crate::state::AppState;

fn badge_style(state: ConnectionState) -> (&'static str, &'static str) {
    match state {
        ConnectionState::Connected => ("bg-green-500", "Live"),
        ConnectionState::Connecting => ("bg-amber-500 animate-pulse", "Connecting"),
        ConnectionState::Reconnecting => ("bg-red-500 animate-pulse", "Polling"),
        ConnectionState::Disconnected => ("bg-slate-500", "Offline"),
    }
}

#[component]
pub fn ConnectionBadge() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    view! {
        <div
            class="fixed bottom-4 left-4 z-30 flex items-center gap-1.5 px-2.5 py-1 rounded-full bg-slate-800/90 border border-slate-700 text-xs text-slate-300"
            title=move || format!("Real-time connection: {}", app_state.connection.get())
        >
            <span class=move || format!("w-2 h-2 rounded-full {}", badge_style(app_state.connection.get()).0) />
            <span>{move || badge_style(app_state.connection.get()).1}</span>
        </div>
    }
}
