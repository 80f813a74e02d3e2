//! HTTP transport seam.
//!
//! [`Fetcher`](super::Fetcher) only needs "GET this URL, give me status and
//! body". Production uses reqwest; tests script responses in memory.

use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (connect failure, timeout, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[cfg(feature = "http")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_transport {
    use super::{HttpResponse, HttpTransport, TransportError};
    use crate::config::SourceConfig;
    use log::debug;
    use std::time::Duration;
    use tokio::time::timeout;

    /// reqwest-backed transport with a per-request timeout.
    pub struct ReqwestTransport {
        client: reqwest::Client,
        timeout: Duration,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Duration) -> Self {
            Self {
                client: reqwest::Client::new(),
                timeout,
            }
        }

        pub fn from_config(config: &SourceConfig) -> Self {
            Self::new(Duration::from_secs(config.timeout_seconds as u64))
        }
    }

    impl HttpTransport for ReqwestTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            debug!("GET {}", url);
            let response = timeout(self.timeout, self.client.get(url).send())
                .await
                .map_err(|_| TransportError(format!("request timeout after {}s", self.timeout.as_secs())))?
                .map_err(|e| TransportError(format!("HTTP request failed: {}", e)))?;

            let status = response.status().as_u16();
            let body = timeout(self.timeout, response.text())
                .await
                .map_err(|_| TransportError(format!("body timeout after {}s", self.timeout.as_secs())))?
                .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;

            Ok(HttpResponse { status, body })
        }
    }
}
