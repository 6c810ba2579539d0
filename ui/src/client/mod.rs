//! Backend Client Layer
//!
//! This module provides the two boundaries to the Spring Insight backend:
//!
//! - **REST**: [`InsightApi`] issues typed requests over an [`HttpTransport`]
//!   and degrades to default values on failure
//! - **Live channel**: [`LiveChannel`] abstracts the push subscription;
//!   [`StompChannel`] implements it with STOMP frames over a WebSocket
//!
//! Both seams are traits so the realtime core can run against test doubles.

mod api;
mod channel;
mod http;
pub mod stomp;
mod websocket;

pub use api::{ExportFile, InsightApi};
pub use channel::{ChannelError, ChannelEvent, ChannelListener, FrameHandler, LiveChannel};
pub use http::GlooTransport;
pub use websocket::StompChannel;

use async_trait::async_trait;

/// Error types for REST requests
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Raw HTTP response as seen by the fetch layer
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// `Content-Type` header, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with a JSON body
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.into().into_bytes(),
        }
    }

    /// Whether the status is 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transports
///
/// The browser implementation is [`GlooTransport`].
#[async_trait(?Send)]
pub trait HttpTransport {
    /// Issue a GET request
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError>;

    /// Issue a POST request without a body
    async fn post(&self, url: &str) -> Result<HttpResponse, ApiError>;
}
