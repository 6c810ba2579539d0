//! Action Bar
//!
//! Floating buttons for manual refresh and export.

use leptos::*;

use super::icons::{DownloadIcon, RefreshIcon};
use crate::state::{AppContext, AppState};

/// Formats offered by the export menu
const EXPORT_FORMATS: [&str; 2] = ["json", "csv"];

#[component]
pub fn ActionBar() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let app_state = expect_context::<AppState>();
    let (refreshing, set_refreshing) = create_signal(false);

    let on_refresh = {
        let ctx = ctx.clone();
        move |_| {
            if refreshing.get_untracked() {
                return;
            }
            set_refreshing.set(true);
            let actions = ctx.actions.clone();
            spawn_local(async move {
                actions.refresh().await;
                set_refreshing.set(false);
            });
        }
    };

    let export_buttons = EXPORT_FORMATS
        .iter()
        .map(|&format| {
            let ctx = ctx.clone();
            view! {
                <button
                    class="flex items-center gap-1.5 px-3 py-1.5 text-xs text-slate-300 hover:text-white hover:bg-slate-700 rounded transition-colors disabled:opacity-50"
                    disabled=move || app_state.loading.get()
                    on:click=move |_| {
                        let actions = ctx.actions.clone();
                        spawn_local(async move {
                            actions.export(Some(format)).await;
                        });
                    }
                >
                    <DownloadIcon class="w-3.5 h-3.5" />
                    {format.to_uppercase()}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="fixed bottom-4 right-4 z-30 flex items-center gap-1 p-1 rounded-lg bg-slate-800/90 border border-slate-700 shadow-lg">
            <button
                class="flex items-center gap-1.5 px-3 py-1.5 text-xs text-slate-300 hover:text-white hover:bg-slate-700 rounded transition-colors disabled:opacity-50"
                disabled=move || refreshing.get()
                on:click=on_refresh
            >
                <RefreshIcon class="w-3.5 h-3.5" />
                "Refresh"
            </button>
            {export_buttons}
        </div>
    }
}
