//! Loading Overlay

use leptos::*;

use super::icons::SpinnerIcon;
use crate::state::AppState;

/// Full-page busy indicator, shown while any global-scope request is in flight
#[component]
pub fn LoadingOverlay() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    view! {
        <Show when=move || app_state.loading.get()>
            <div class="fixed inset-0 z-40 flex items-center justify-center bg-black/20 pointer-events-none">
                <div class="flex items-center gap-2 px-4 py-2 rounded-lg bg-slate-800 border border-slate-700 text-slate-200 shadow-lg">
                    <SpinnerIcon class="w-4 h-4" />
                    <span class="text-sm">"Loading..."</span>
                </div>
            </div>
        </Show>
    }
}
