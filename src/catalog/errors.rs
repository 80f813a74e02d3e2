use thiserror::Error;

/// Errors that can arise while loading the item catalog.
///
/// Every variant here propagates through [`DatasetLoader::load_all`](crate::catalog::DatasetLoader::load_all) unchanged;
/// a single failure fails the whole load.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Terminal HTTP failure (4xx or other non-retryable status). Not retried.
    #[error("request to {url} failed with status {status}")]
    Network { url: String, status: u16 },

    /// Retryable failures persisted past the retry budget.
    #[error("gave up on {url} after {attempts} attempts: {last}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last: String,
    },

    /// Payload is not a JSON array at the top level (or not JSON at all).
    #[error("unexpected payload shape for {dataset}: {found}")]
    Shape { dataset: String, found: String },

    /// Every record in the payload was rejected by validation.
    #[error("no valid records in {dataset} ({rejected} rejected)")]
    EmptyResult { dataset: String, rejected: usize },
}

impl CatalogError {
    /// Whether repeating the whole load later might succeed.
    pub fn is_retryable_load(&self) -> bool {
        matches!(self, CatalogError::ExhaustedRetries { .. })
    }
}

/// Failure reading or writing the cache backing store.
///
/// Never surfaced to callers of the cache store: it is logged and downgraded
/// to a miss (read) or ignored (write).
#[derive(Debug, Error)]
pub enum CacheIoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}
