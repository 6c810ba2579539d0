//! Confirm Dialog
//!
//! Modal for the oldest pending confirmation. Every way of closing it other
//! than the confirm button answers `false`.

use leptos::*;

use super::icons::{CloseIcon, WarningIcon};
use crate::notifications::{ConfirmAction, ConfirmPrompt};
use crate::state::{AppContext, AppState};

/// Shows the oldest pending confirmation, if any
#[component]
pub fn ConfirmDialog() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let current = move || app_state.confirms.with(|confirms| confirms.first().cloned());

    view! {
        {move || current().map(|prompt| view! { <ConfirmModal prompt=prompt /> })}
    }
}

#[component]
fn ConfirmModal(prompt: ConfirmPrompt) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let id = prompt.id;

    let resolve = move |action: ConfirmAction| {
        ctx.notifications.resolve_confirm(id, action);
    };
    let resolve_key = resolve.clone();
    let resolve_close = resolve.clone();
    let resolve_cancel = resolve.clone();
    let resolve_confirm = resolve.clone();

    let on_keydown = window_event_listener(ev::keydown, move |ev| {
        if ev.key() == "Escape" {
            resolve_key(ConfirmAction::Escape);
        }
    });
    on_cleanup(move || on_keydown.remove());

    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center">
            // Backdrop
            <div
                class="absolute inset-0 bg-black/60 backdrop-blur-sm"
                on:click=move |_| resolve(ConfirmAction::Backdrop)
            />

            // Modal
            <div class="relative bg-slate-800 rounded-xl border border-slate-700 shadow-2xl w-full max-w-md mx-4">
                // Header
                <div class="flex items-center justify-between px-6 py-4 border-b border-slate-700">
                    <div class="flex items-center gap-2">
                        <WarningIcon class="w-5 h-5 text-amber-400" />
                        <h2 class="text-lg font-semibold text-white">{prompt.title}</h2>
                    </div>
                    <button
                        class="p-1 text-slate-400 hover:text-white rounded transition-colors"
                        on:click=move |_| resolve_close(ConfirmAction::Close)
                    >
                        <CloseIcon class="w-5 h-5" />
                    </button>
                </div>

                // Body
                <div class="p-6">
                    <p class="text-slate-300">{prompt.message}</p>
                </div>

                // Actions
                <div class="flex items-center justify-end gap-3 px-6 py-4 border-t border-slate-700">
                    <button
                        class="px-4 py-2 text-sm text-slate-300 hover:text-white transition-colors"
                        on:click=move |_| resolve_cancel(ConfirmAction::Cancel)
                    >
                        "Cancel"
                    </button>
                    <button
                        class="px-4 py-2 text-sm font-medium text-white bg-blue-600 hover:bg-blue-500 rounded-lg transition-colors"
                        on:click=move |_| resolve_confirm(ConfirmAction::Confirm)
                    >
                        "Confirm"
                    </button>
                </div>
            </div>
        </div>
    }
}
