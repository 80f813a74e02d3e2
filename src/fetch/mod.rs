//! # Resilient dataset fetcher
//!
//! Issues a GET through an [`HttpTransport`], retrying server errors and
//! transport failures with exponential backoff and failing fast on client
//! errors. A successful body is parsed as JSON and returned untouched; shape
//! checks belong to [`crate::validation`].
//!
//! ```rust,no_run
//! use arcdex::fetch::{Fetcher, ReqwestTransport, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), arcdex::catalog::CatalogError> {
//! let fetcher = Fetcher::new(ReqwestTransport::new(Duration::from_secs(10)), RetryPolicy::default());
//! let raw = fetcher.fetch("https://example.invalid/data/items.json").await?;
//! println!("{}", raw);
//! # Ok(())
//! # }
//! ```

pub mod retry;
pub mod transport;

pub use retry::{FetchFailure, RetryAction, RetryPolicy};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpResponse, HttpTransport, TransportError};

use log::{debug, warn};
use serde_json::Value;

use crate::catalog::errors::CatalogError;
use crate::logutil::escape_log_preview;
use crate::metrics;

pub struct Fetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// Fails with [`CatalogError::Network`] on a terminal status,
    /// [`CatalogError::ExhaustedRetries`] once the attempt budget is spent, or
    /// [`CatalogError::Shape`] when a successful body is not JSON.
    pub async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            metrics::inc_http_attempts();
            debug!("fetching {} (attempt {}/{})", url, attempts, self.policy.max_attempts);

            let failure = match self.transport.get(url).await {
                Ok(response) if response.is_success() => return parse_body(url, &response.body),
                Ok(response) => FetchFailure::Status(response.status),
                Err(e) => FetchFailure::Transport(e.0),
            };

            match self.policy.next_action(attempts, &failure) {
                RetryAction::Retry { delay } => {
                    metrics::inc_http_retries();
                    warn!(
                        "fetch {} failed ({}), retrying in {:.1}s",
                        url,
                        failure,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryAction::GiveUp => {
                    metrics::inc_http_failures();
                    warn!("fetch {} failed ({}), not retrying", url, failure);
                    return Err(match failure {
                        FetchFailure::Status(status) => CatalogError::Network {
                            url: url.to_string(),
                            status,
                        },
                        FetchFailure::Transport(last) => CatalogError::ExhaustedRetries {
                            url: url.to_string(),
                            attempts,
                            last,
                        },
                    });
                }
                RetryAction::Exhausted => {
                    metrics::inc_http_failures();
                    warn!("fetch {} failed ({}) after {} attempts", url, failure, attempts);
                    return Err(CatalogError::ExhaustedRetries {
                        url: url.to_string(),
                        attempts,
                        last: failure.to_string(),
                    });
                }
            }
        }
    }
}

fn parse_body(url: &str, body: &str) -> Result<Value, CatalogError> {
    serde_json::from_str(body).map_err(|e| {
        warn!("{} returned a body that is not JSON: {}", url, escape_log_preview(body, 120));
        CatalogError::Shape {
            dataset: url.to_string(),
            found: format!("invalid JSON: {}", e),
        }
    })
}
