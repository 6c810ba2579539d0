//! Toast Stack
//!
//! Renders the notification queue's toasts in the top-right corner.

use leptos::*;

use super::icons::CloseIcon;
use crate::notifications::{Severity, Toast};
use crate::state::{AppContext, AppState};

fn severity_classes(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "bg-sky-500/10 border-sky-500/30 text-sky-300",
        Severity::Success => "bg-green-500/10 border-green-500/30 text-green-300",
        Severity::Warning => "bg-amber-500/10 border-amber-500/30 text-amber-300",
        Severity::Error => "bg-red-500/10 border-red-500/30 text-red-300",
    }
}

/// All visible toasts, newest last
#[component]
pub fn ToastStack() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    view! {
        <div class="fixed top-4 right-4 z-50 flex flex-col gap-2 w-80">
            <For
                each=move || app_state.toasts.get()
                key=|toast| toast.id
                children=move |toast| view! { <ToastItem toast=toast /> }
            />
        </div>
    }
}

#[component]
fn ToastItem(toast: Toast) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let id = toast.id;

    view! {
        <div
            class=format!(
                "flex items-start gap-3 px-4 py-3 rounded-lg border shadow-lg backdrop-blur-sm {}",
                severity_classes(toast.severity)
            )
            role="alert"
            data-severity=toast.severity.as_str()
        >
            <p class="flex-1 text-sm">{toast.message}</p>
            <button
                class="p-0.5 opacity-70 hover:opacity-100 transition-opacity"
                on:click=move |_| {
                    ctx.notifications.dismiss(id);
                }
            >
                <CloseIcon class="w-4 h-4" />
            </button>
        </div>
    }
}
