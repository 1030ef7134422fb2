//! Error types for the inlining engine
//!
//! Resource-local failures (bad URL, failed fetch, undecodable payload) are
//! carried as values and never abort a pass; only top-level failures reach
//! the caller as `InlineError`.

use thiserror::Error;

/// Result type alias for inlining operations
pub type InlineResult<T> = Result<T, InlineError>;

/// Error types for inlining operations
#[derive(Debug, Error)]
pub enum InlineError {
    /// Reference could not be parsed or resolved against the base URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failure, timeout, or non-success status
    #[error("Fetch failed for {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    /// Fetched bytes could not be interpreted as the expected content type
    #[error("Failed to decode {url}: {reason}")]
    DecodeFailure { url: String, reason: String },

    /// Frame recursion re-entered a URL already being inlined
    #[error("Frame cycle detected at {url}")]
    CycleDetected { url: String },

    /// The external page renderer could not produce a document
    #[error("Render failed for {url}: {reason}")]
    RenderFailure { url: String, reason: String },

    /// IO error during serialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8
    #[error("Serialized output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl InlineError {
    /// Check if the error is local to a single resource reference.
    ///
    /// Resource-local errors are converted into the per-resource failure
    /// policy (cleared attribute plus a log line) and never abort a pass.
    /// Non-local errors are surfaced to the caller.
    #[must_use]
    pub fn is_resource_local(&self) -> bool {
        matches!(
            self,
            InlineError::InvalidUrl { .. }
                | InlineError::FetchFailure { .. }
                | InlineError::DecodeFailure { .. }
                | InlineError::CycleDetected { .. }
        )
    }
}
