//! Spring Insight Realtime Client
//!
//! Browser-side client of the Spring Insight dashboard, compiled to
//! WebAssembly and mounted on top of the server-rendered pages.
//!
//! # Architecture
//!
//! Updates reach the page in two ways:
//! - **Live channel**: STOMP over a WebSocket, pushing stats, topology,
//!   traces and error alerts
//! - **Polling fallback**: `GET /api/realtime-stats` on an interval while
//!   the live channel is down
//!
//! # Modules
//!
//! - [`app`]: Root component and page bootstrap
//! - [`client`]: REST client and live channel
//! - [`realtime`]: Connection manager, update dispatcher, visibility handling
//! - [`notifications`]: Toasts and confirmations
//! - [`loading`]: Reference-counted busy indicator
//! - [`actions`]: Manual refresh and export
//! - [`components`]: Leptos overlay components
//! - [`state`]: Application context and reactive state

pub mod actions;
pub mod app;
pub mod client;
pub mod components;
pub mod dom;
pub mod format;
pub mod loading;
pub mod notifications;
pub mod realtime;
pub mod runtime;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
