//! REST Data Fetch Layer
//!
//! Typed wrappers around the Spring Insight UI endpoints. Every request holds
//! a [`LoadingGuard`](crate::loading::LoadingGuard) for its whole lifetime,
//! so the busy indicator is released on success, failure and cancellation.
//!
//! The list/object accessors never fail: errors are logged and the caller
//! gets an empty default. Use [`InsightApi::get_json`] to see the error.

use std::rc::Rc;

use insight_shared::{Payload, RealtimeConfig};
use serde::de::DeserializeOwned;

use super::{ApiError, HttpResponse, HttpTransport};
use crate::format::format_duration;
use crate::loading::{LoadingTracker, GLOBAL_SCOPE};

/// A file returned by the export endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    /// Suggested download name
    pub filename: String,

    /// MIME type reported by the backend
    pub mime_type: String,

    /// File contents
    pub bytes: Vec<u8>,
}

/// Client for the Spring Insight REST API
#[derive(Clone)]
pub struct InsightApi {
    config: Rc<RealtimeConfig>,
    transport: Rc<dyn HttpTransport>,
    loading: LoadingTracker,
}

impl InsightApi {
    /// Create a new API client
    pub fn new(config: &RealtimeConfig, transport: Rc<dyn HttpTransport>, loading: LoadingTracker) -> Self {
        Self {
            config: Rc::new(config.clone()),
            transport,
            loading,
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<HttpResponse, ApiError> {
        let url = self.config.api_url(path);
        let _busy = self.loading.guard(GLOBAL_SCOPE);
        let started = chrono::Utc::now();

        let result = match method {
            Method::Get => self.transport.get(&url).await,
            Method::Post => self.transport.post(&url).await,
        };

        let elapsed = chrono::Utc::now() - started;
        tracing::debug!(
            "API request: {} {}, took {}",
            method.as_str(),
            url,
            format_duration(elapsed.num_milliseconds().max(0) as u64)
        );

        let response = result?;
        if !response.ok() {
            return Err(ApiError::Status {
                status: response.status,
                url,
            });
        }
        Ok(response)
    }

    /// GET `path` and decode the JSON body, propagating any failure
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::Get, path).await?;
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET `path`, returning `default` on any failure
    pub async fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        match self.get_json(path).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Request to {} failed: {}", path, e);
                default
            }
        }
    }

    /// Names of all services that reported spans
    pub async fn services(&self) -> Vec<String> {
        self.get_or("/api/services", Vec::new()).await
    }

    /// Service dependency edges observed in the last `hours`
    pub async fn dependencies(&self, hours: u32) -> Vec<Payload> {
        self.get_or(&format!("/api/dependencies?hours={}", hours), Vec::new()).await
    }

    /// Per-service call statistics
    pub async fn service_stats(&self) -> Vec<Payload> {
        self.get_or("/api/services/stats", Vec::new()).await
    }

    /// Error breakdown for the last `hours`
    pub async fn error_analysis(&self, hours: u32) -> Vec<Payload> {
        self.get_or(&format!("/api/errors/analysis?hours={}", hours), Vec::new()).await
    }

    /// Collector counters (empty object on failure)
    pub async fn collector_stats(&self) -> Payload {
        self.get_or("/api/stats", empty_object()).await
    }

    /// Most recent spans across all services
    pub async fn recent_traces(&self, hours: u32, limit: u32) -> Vec<Payload> {
        self.get_or(&format!("/api/traces/recent?hours={}&limit={}", hours, limit), Vec::new())
            .await
    }

    /// Most recent spans of one service
    pub async fn service_traces(&self, service: &str, limit: u32) -> Vec<Payload> {
        let path = format!(
            "/api/services/{}/traces?limit={}",
            urlencoding::encode(service),
            limit
        );
        self.get_or(&path, Vec::new()).await
    }

    /// All spans of one trace
    pub async fn trace_detail(&self, trace_id: &str) -> Vec<Payload> {
        let path = format!("/api/traces/{}", urlencoding::encode(trace_id));
        self.get_or(&path, Vec::new()).await
    }

    /// Snapshot used by the fallback poller; shaped like a stats update
    pub async fn realtime_stats(&self) -> Result<Payload, ApiError> {
        self.get_json("/api/realtime-stats").await
    }

    /// Ask the backend to drop its caches
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.request(Method::Post, "/api/refresh").await.map(|_| ())
    }

    /// Download an export of the collected data in `format`
    pub async fn export(&self, format: &str, filename: String) -> Result<ExportFile, ApiError> {
        let path = format!("/api/export?format={}", urlencoding::encode(format));
        let response = self.request(Method::Get, &path).await?;

        Ok(ExportFile {
            filename,
            mime_type: response
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: response.body,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

fn empty_object() -> Payload {
    Payload::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use futures::executor::block_on;
    use serde_json::json;

    fn api(transport: &Rc<FakeTransport>) -> (InsightApi, LoadingTracker) {
        let loading = LoadingTracker::new();
        let api = InsightApi::new(&RealtimeConfig::default(), transport.clone(), loading.clone());
        (api, loading)
    }

    #[test]
    fn test_failed_services_returns_empty() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond("/insight-ui/api/services", Err(ApiError::Network("connection refused".into())));
        let (api, loading) = api(&transport);

        let services = block_on(api.services());

        assert!(services.is_empty());
        assert_eq!(loading.ref_count(GLOBAL_SCOPE), 0);
    }

    #[test]
    fn test_failure_does_not_block_other_requests() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond("/insight-ui/api/services", Ok(HttpResponse::json(500, "oops")));
        transport.respond("/insight-ui/api/stats", Ok(HttpResponse::json(200, r#"{"totalReceivedSpans":7}"#)));
        let (api, loading) = api(&transport);

        let (services, stats) = block_on(futures::future::join(api.services(), api.collector_stats()));

        assert!(services.is_empty());
        assert_eq!(stats["totalReceivedSpans"], json!(7));
        assert_eq!(loading.ref_count(GLOBAL_SCOPE), 0);
    }

    #[test]
    fn test_malformed_body_uses_default() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond("/insight-ui/api/stats", Ok(HttpResponse::json(200, "<html>")));
        let (api, _) = api(&transport);

        assert_eq!(block_on(api.collector_stats()), json!({}));
        assert!(matches!(
            block_on(api.get_json::<Payload>("/api/stats")),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_query_paths() {
        let transport = Rc::new(FakeTransport::new());
        let (api, _) = api(&transport);

        block_on(async {
            api.dependencies(24).await;
            api.recent_traces(1, 20).await;
            api.service_traces("order service", 50).await;
            api.trace_detail("abc123").await;
        });

        assert_eq!(
            transport.requests(),
            vec![
                "GET /insight-ui/api/dependencies?hours=24".to_string(),
                "GET /insight-ui/api/traces/recent?hours=1&limit=20".to_string(),
                "GET /insight-ui/api/services/order%20service/traces?limit=50".to_string(),
                "GET /insight-ui/api/traces/abc123".to_string(),
            ]
        );
    }

    #[test]
    fn test_realtime_stats_propagates_status() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond("/insight-ui/api/realtime-stats", Ok(HttpResponse::json(503, "")));
        let (api, loading) = api(&transport);

        let err = block_on(api.realtime_stats()).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 503,
                url: "/insight-ui/api/realtime-stats".to_string()
            }
        );
        assert_eq!(loading.ref_count(GLOBAL_SCOPE), 0);
    }

    #[test]
    fn test_overlapping_requests_net_to_zero() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond("/insight-ui/api/services", Ok(HttpResponse::json(200, r#"["a","b"]"#)));
        let (api, loading) = api(&transport);
        let seen_busy = Rc::new(std::cell::Cell::new(0usize));
        {
            let seen_busy = seen_busy.clone();
            loading.on_change(Rc::new(move |_, visible| {
                if visible {
                    seen_busy.set(seen_busy.get() + 1);
                }
            }));
        }

        let results = block_on(futures::future::join_all((0..4).map(|_| api.services())));

        assert!(results.iter().all(|names| names.len() == 2));
        assert_eq!(loading.ref_count(GLOBAL_SCOPE), 0);
        assert!(seen_busy.get() >= 1);
    }

    #[test]
    fn test_export_uses_content_type() {
        let transport = Rc::new(FakeTransport::new());
        transport.respond(
            "/insight-ui/api/export?format=csv",
            Ok(HttpResponse {
                status: 200,
                content_type: Some("text/csv".to_string()),
                body: b"a,b\n".to_vec(),
            }),
        );
        let (api, _) = api(&transport);

        let file = block_on(api.export("csv", "spring-insight-2026-10-18.csv".to_string())).unwrap();
        assert_eq!(file.mime_type, "text/csv");
        assert_eq!(file.bytes, b"a,b\n".to_vec());
    }
}
