//! Spring Insight Client Entry Point
//!
//! Initializes logging and mounts the Leptos app to the DOM.

use insight_ui::App;
use leptos::*;
use tracing_wasm::WASMLayerConfigBuilder;

fn main() {
    // Initialize WASM tracing
    let config = WASMLayerConfigBuilder::default()
        .set_max_level(tracing::Level::DEBUG)
        .build();
    tracing_wasm::set_as_global_default_with_config(config);

    tracing::info!("Starting Spring Insight client");

    mount_to_body(|| view! { <App /> });
}
