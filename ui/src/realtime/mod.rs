//! Real-time Update Core
//!
//! - [`ConnectionManager`]: live channel lifecycle, reconnects and the
//!   polling fallback
//! - [`UpdateDispatcher`]: routes messages to page updates and callbacks
//! - [`VisibilityCoordinator`]: pauses everything while the tab is hidden
//! - [`RenderRegistry`]: chart callbacks owned by the host page

mod connection;
mod dispatcher;
mod registry;
mod status;
mod visibility;

pub use connection::{ConnectionDeps, ConnectionManager, ConnectionState, StateListener, Subscription};
pub use dispatcher::{
    UpdateDispatcher, ERROR_COUNT_ID, HIGHLIGHT_CLASS, PULSE_CLASS, RUNNING_HOURS_ID, SUCCESS_RATE_ID,
    TOTAL_REQUESTS_ID, TOTAL_SPANS_ID,
};
pub use registry::{RenderFn, RenderRegistry, RenderTarget};
pub use status::{bind_status, render_status, status_markup, STATUS_ELEMENT_ID};
pub use visibility::{Visibility, VisibilityCoordinator};
