//! Connection status indicator on the server-rendered page

use std::rc::Rc;

use super::connection::{ConnectionManager, ConnectionState};
use crate::dom::UiSurface;

/// Element id of the status indicator
pub const STATUS_ELEMENT_ID: &str = "ws-status";

/// Markup and tooltip shown for `state`
pub fn status_markup(state: ConnectionState) -> (&'static str, &'static str) {
    match state {
        ConnectionState::Connected => (
            r#"<i class="fas fa-plug text-success"></i> Live"#,
            "Real-time connection active",
        ),
        ConnectionState::Connecting => (
            r#"<i class="fas fa-plug text-warning"></i> Connecting"#,
            "Opening real-time connection",
        ),
        ConnectionState::Reconnecting | ConnectionState::Disconnected => (
            r#"<i class="fas fa-plug text-danger"></i> Disconnected"#,
            "Real-time connection lost, updating by polling",
        ),
    }
}

/// Write the indicator for `state`
pub fn render_status(surface: &dyn UiSurface, state: ConnectionState) {
    let (html, title) = status_markup(state);
    if surface.set_html(STATUS_ELEMENT_ID, html) {
        surface.set_title(STATUS_ELEMENT_ID, title);
    }
}

/// Keep the indicator in sync with `connection`
pub fn bind_status(connection: &ConnectionManager, surface: Rc<dyn UiSurface>) {
    render_status(surface.as_ref(), connection.state());
    connection.on_state_change(Rc::new(move |state| render_status(surface.as_ref(), state)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;

    #[test]
    fn test_render_status() {
        let surface = FakeSurface::new().with_element(STATUS_ELEMENT_ID, "");

        render_status(&surface, ConnectionState::Connected);
        let el = surface.element(STATUS_ELEMENT_ID).unwrap();
        assert!(el.html.contains("text-success"));
        assert_eq!(el.title, "Real-time connection active");

        render_status(&surface, ConnectionState::Reconnecting);
        let el = surface.element(STATUS_ELEMENT_ID).unwrap();
        assert!(el.html.contains("text-danger"));
        assert!(el.title.contains("polling"));
    }

    #[test]
    fn test_missing_indicator_is_skipped() {
        let surface = FakeSurface::new();
        render_status(&surface, ConnectionState::Connected);
        assert!(surface.element(STATUS_ELEMENT_ID).is_none());
    }
}
