//! UI Components
//!
//! Overlay components mounted on top of the server-rendered dashboard:
//! - `toast`: Notification toasts
//! - `confirm`: Confirmation modal
//! - `overlay`: Global loading indicator
//! - `badge`: Live connection badge
//! - `action_bar`: Refresh and export buttons

pub mod action_bar;
pub mod badge;
pub mod confirm;
pub mod icons;
pub mod overlay;
pub mod toast;

pub use action_bar::ActionBar;
pub use badge::ConnectionBadge;
pub use confirm::ConfirmDialog;
pub use overlay::LoadingOverlay;
pub use toast::ToastStack;
