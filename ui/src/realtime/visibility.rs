//! Visibility Coordinator
//!
//! Backgrounded tabs stop both the live channel and polling; returning to
//! the foreground resumes polling and reconnects if needed. Only the
//! connection manager's public start/stop and pause/resume calls are used.

use std::cell::Cell;

use super::connection::ConnectionManager;

/// Page visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn from_hidden(hidden: bool) -> Self {
        if hidden {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }
}

/// Reacts to page foreground/background transitions
pub struct VisibilityCoordinator {
    connection: ConnectionManager,
    current: Cell<Visibility>,
}

impl VisibilityCoordinator {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            current: Cell::new(Visibility::Visible),
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.current.get()
    }

    /// Apply a visibility change reported by the page
    pub fn set_visibility(&self, visibility: Visibility) {
        self.current.set(visibility);
        match visibility {
            Visibility::Hidden => self.on_hidden(),
            Visibility::Visible => self.on_visible(),
        }
    }

    /// Page moved to the background; in-flight requests are left alone
    pub fn on_hidden(&self) {
        tracing::debug!("Page hidden, pausing updates");
        self.connection.pause_polling();
        self.connection.stop();
    }

    /// Page returned to the foreground
    pub fn on_visible(&self) {
        tracing::debug!("Page visible, resuming updates");
        self.connection.resume_polling();
        if !self.connection.is_connected() {
            self.connection.start();
        }
    }
}
