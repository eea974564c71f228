use thiserror::Error;

/// Top-level error type shared by every `avgcalc` crate.
///
/// Upstream failures are deliberately absent: the fetcher absorbs them and
/// hands back a fallback batch instead.
#[derive(Debug, Error)]
pub enum AvgError {
    #[error("invalid window size {0}: must be a positive integer")]
    InvalidWindowSize(i64),

    #[error("unknown number category '{0}' (expected one of p, f, e, r)")]
    UnknownCategory(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = AvgError> = std::result::Result<T, E>;
