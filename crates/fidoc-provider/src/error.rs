//! Error types for the provider layer.

use thiserror::Error;

/// Errors a provider call can fail with.
///
/// Every variant is treated the same by the fallback chain: the next provider
/// is tried. The distinction is kept for logging and for retry decisions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Connection-level failure (DNS, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The call did not complete within its deadline.
    #[error("provider call timed out after {0} ms")]
    Timeout(u64),

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The provider answered but the payload could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider refused the call because of its own rate limit.
    #[error("rate limited")]
    RateLimited,

    /// The provider cannot handle this file (format, size, page count).
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

impl ProviderError {
    /// Whether repeating the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) | ProviderError::RateLimited => {
                true
            }
            ProviderError::Http { status, .. } => *status >= 500 || *status == 429,
            ProviderError::InvalidResponse(_) | ProviderError::Unsupported(_) => false,
        }
    }
}
