//! HTTP transport for the collector endpoint
//!
//! A non-2xx status is returned as a normal [`TransportResponse`]; only
//! network-level failures (DNS, connect, timeouts, unreadable body) are errors.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Hard cap on the whole request, connect included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on establishing the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// A prepared POST
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl OutboundRequest {
    /// Header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a collector response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a single request to the collector
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport. One attempt per call, never retried, redirects not followed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(REQUEST_TIMEOUT, CONNECT_TIMEOUT)
    }

    /// Transport with custom timeouts
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        // A 3xx is the collector's answer, not an instruction to re-send
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse> {
        let mut builder = self.http_client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(url = %request.url, status, "Collector responded");

        Ok(TransportResponse { status, body })
    }
}
