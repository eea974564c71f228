use thiserror::Error;

/// Why an upstream request produced no usable numbers.
///
/// Only ever logged; the fetcher replaces the batch with fallback data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("request task ended without a response")]
    Abandoned,
}
