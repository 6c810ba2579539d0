//! Dashboard Actions
//!
//! Manual refresh and data export, triggered from the action bar, and
//! clipboard copies for `data-copy` elements on the page.

use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use insight_shared::Command;

use crate::client::InsightApi;
use crate::dom::PageHost;
use crate::format::export_filename;
use crate::notifications::{NotificationQueue, Severity};
use crate::realtime::ConnectionManager;

/// Export format used when none is chosen
pub const DEFAULT_EXPORT_FORMAT: &str = "json";

/// How a refresh request was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Sent as a command on the live channel
    Pushed,
    /// Posted over REST; the page is reloading
    Reloaded,
    /// The REST request failed
    Failed,
}

#[derive(Clone)]
pub struct DashboardActions {
    connection: ConnectionManager,
    api: InsightApi,
    notifications: NotificationQueue,
    host: Rc<dyn PageHost>,
}

impl DashboardActions {
    pub fn new(
        connection: ConnectionManager,
        api: InsightApi,
        notifications: NotificationQueue,
        host: Rc<dyn PageHost>,
    ) -> Self {
        Self {
            connection,
            api,
            notifications,
            host,
        }
    }

    /// Ask the backend for fresh data
    ///
    /// Over the live channel when connected; otherwise `POST /api/refresh`
    /// followed by a page reload.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.notifications.toast("Refreshing data...", Severity::Info);

        match self.connection.send_command(Command::Refresh) {
            Ok(()) => return RefreshOutcome::Pushed,
            Err(e) => tracing::debug!("Refresh command not sent ({}), using REST", e),
        }

        match self.api.refresh().await {
            Ok(()) => {
                self.notifications.toast("Data refreshed", Severity::Success);
                self.host.reload();
                RefreshOutcome::Reloaded
            }
            Err(e) => {
                tracing::error!("Refresh failed: {}", e);
                self.notifications
                    .toast(format!("Refresh failed: {}", e), Severity::Error);
                RefreshOutcome::Failed
            }
        }
    }

    /// Download an export in `format` (default `json`)
    pub async fn export(&self, format: Option<&str>) -> bool {
        self.export_on(format.unwrap_or(DEFAULT_EXPORT_FORMAT), Utc::now().date_naive())
            .await
    }

    /// Copy `text` to the clipboard and report the result
    pub async fn copy_to_clipboard(&self, text: &str) -> bool {
        match self.host.copy_to_clipboard(text).await {
            Ok(()) => {
                self.notifications.toast("Copied to clipboard", Severity::Success);
                true
            }
            Err(e) => {
                tracing::warn!("Clipboard write failed: {}", e);
                self.notifications.toast("Copy failed", Severity::Error);
                false
            }
        }
    }

    async fn export_on(&self, format: &str, date: NaiveDate) -> bool {
        let filename = export_filename(format, date);

        let result = match self.api.export(format, filename).await {
            Ok(file) => self.host.download(&file).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                self.notifications.toast("Export complete", Severity::Success);
                true
            }
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.notifications
                    .toast(format!("Export failed: {}", e), Severity::Error);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, HttpResponse};
    use crate::loading::{LoadingTracker, GLOBAL_SCOPE};
    use crate::realtime::{ConnectionDeps, RenderRegistry, UpdateDispatcher};
    use crate::testing::{FakeChannel, FakeHost, FakeSurface, FakeTransport, ManualScheduler};
    use futures::executor::block_on;
    use insight_shared::RealtimeConfig;

    struct Fixture {
        actions: DashboardActions,
        connection: ConnectionManager,
        channel: Rc<FakeChannel>,
        transport: Rc<FakeTransport>,
        host: Rc<FakeHost>,
        notifications: NotificationQueue,
        loading: LoadingTracker,
    }

    fn fixture() -> Fixture {
        let scheduler = ManualScheduler::new();
        let channel = Rc::new(FakeChannel::new());
        let transport = Rc::new(FakeTransport::new());
        let host = Rc::new(FakeHost::default());
        let loading = LoadingTracker::new();
        let notifications = NotificationQueue::new(Rc::new(scheduler.clone()), 5000);
        let api = InsightApi::new(&RealtimeConfig::default(), transport.clone(), loading.clone());
        let dispatcher = UpdateDispatcher::new(
            Rc::new(FakeSurface::new()),
            RenderRegistry::new(),
            notifications.clone(),
            Rc::new(scheduler.clone()),
            1000,
            1000,
        );
        let connection = ConnectionManager::new(ConnectionDeps {
            channel: channel.clone(),
            api: api.clone(),
            dispatcher,
            notifications: notifications.clone(),
            scheduler: Rc::new(scheduler),
            reconnect_delay_ms: 5000,
            poll_interval_ms: 30000,
        });
        let actions = DashboardActions::new(connection.clone(), api, notifications.clone(), host.clone());

        Fixture {
            actions,
            connection,
            channel,
            transport,
            host,
            notifications,
            loading,
        }
    }

    fn last_toast(notifications: &NotificationQueue) -> (Severity, String) {
        let toast = notifications.toasts().pop().unwrap();
        (toast.severity, toast.message)
    }

    #[test]
    fn test_refresh_uses_live_channel_when_connected() {
        let f = fixture();
        f.connection.start();
        f.channel.accept();

        assert_eq!(block_on(f.actions.refresh()), RefreshOutcome::Pushed);
        assert_eq!(f.channel.sent().len(), 1);
        assert!(f.transport.requests().is_empty());
        assert_eq!(f.host.reloads.get(), 0);
        assert_eq!(last_toast(&f.notifications), (Severity::Info, "Refreshing data...".to_string()));
    }

    #[test]
    fn test_refresh_posts_and_reloads_when_offline() {
        let f = fixture();
        f.transport.respond("/insight-ui/api/refresh", Ok(HttpResponse::json(200, "{}")));

        assert_eq!(block_on(f.actions.refresh()), RefreshOutcome::Reloaded);
        assert_eq!(f.transport.requests(), vec!["POST /insight-ui/api/refresh".to_string()]);
        assert_eq!(f.host.reloads.get(), 1);
        assert_eq!(last_toast(&f.notifications).0, Severity::Success);
    }

    #[test]
    fn test_refresh_failure_does_not_reload() {
        let f = fixture();
        f.transport.respond(
            "/insight-ui/api/refresh",
            Err(ApiError::Network("offline".to_string())),
        );

        assert_eq!(block_on(f.actions.refresh()), RefreshOutcome::Failed);
        assert_eq!(f.host.reloads.get(), 0);
        assert_eq!(
            last_toast(&f.notifications),
            (Severity::Error, "Refresh failed: Network error: offline".to_string())
        );
        assert_eq!(f.loading.ref_count(GLOBAL_SCOPE), 0);
    }

    #[test]
    fn test_export_downloads_dated_file() {
        let f = fixture();
        f.transport.respond(
            "/insight-ui/api/export?format=csv",
            Ok(HttpResponse {
                status: 200,
                content_type: Some("text/csv".to_string()),
                body: b"a,b\n1,2\n".to_vec(),
            }),
        );

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(block_on(f.actions.export_on("csv", date)));

        let downloads = f.host.downloads.borrow();
        assert_eq!(downloads[0].filename, "spring-insight-2024-05-01.csv");
        assert_eq!(downloads[0].mime_type, "text/csv");
        assert_eq!(downloads[0].bytes, b"a,b\n1,2\n".to_vec());
        assert_eq!(last_toast(&f.notifications).0, Severity::Success);
    }

    #[test]
    fn test_copy_to_clipboard_reports_result() {
        let f = fixture();

        assert!(block_on(f.actions.copy_to_clipboard("trace-42")));
        assert_eq!(*f.host.clipboard.borrow(), vec!["trace-42".to_string()]);
        assert_eq!(
            last_toast(&f.notifications),
            (Severity::Success, "Copied to clipboard".to_string())
        );

        f.host.deny_clipboard.set(true);
        assert!(!block_on(f.actions.copy_to_clipboard("trace-43")));
        assert_eq!(f.host.clipboard.borrow().len(), 1);
        assert_eq!(last_toast(&f.notifications), (Severity::Error, "Copy failed".to_string()));
    }

    #[test]
    fn test_export_defaults_to_json() {
        let f = fixture();

        assert!(!block_on(f.actions.export(None)));

        assert_eq!(
            f.transport.requests(),
            vec!["GET /insight-ui/api/export?format=json".to_string()]
        );
        assert!(f.host.downloads.borrow().is_empty());
        assert_eq!(last_toast(&f.notifications).0, Severity::Error);
        assert_eq!(f.loading.ref_count(GLOBAL_SCOPE), 0);
    }
}
