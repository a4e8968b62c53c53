//! Error types for metadata service operations.

use thiserror::Error;

/// Errors that can occur when talking to the instance metadata service.
///
/// The detector never surfaces these; every transport failure is folded
/// into a negative probe outcome. They reach callers only through client
/// construction and the CLI's output path.
#[derive(Debug, Error)]
pub enum ImdsError {
    /// Network error, connection refused, or timeout.
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Response exceeds maximum allowed size.
    #[error("response too large: {0} bytes exceeds limit of {1} bytes")]
    TooLarge(usize, usize),

    /// JSON serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
