//! Browser HTTP Transport
//!
//! [`HttpTransport`] implementation on top of `gloo-net`'s fetch wrapper.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};

use super::{ApiError, HttpResponse, HttpTransport};

/// Fetch-based transport used in the browser
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

impl GlooTransport {
    pub fn new() -> Self {
        Self
    }

    async fn read(response: Response) -> Result<HttpResponse, ApiError> {
        let status = response.status();
        let content_type = response.headers().get("content-type");
        let body = response
            .binary()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait(?Send)]
impl HttpTransport for GlooTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        let response = Request::get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read(response).await
    }

    async fn post(&self, url: &str) -> Result<HttpResponse, ApiError> {
        let response = Request::post(url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read(response).await
    }
}
