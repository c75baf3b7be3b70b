//! Error types for the fidoc-core library.

use thiserror::Error;

use crate::provider::budget::BudgetViolation;

/// Main error type for the fidoc library.
///
/// Only caller-actionable failures live here. An ambiguous classification or
/// a failed field check is not an error: both are reported inside a
/// successful [`AggregatedExtraction`](crate::AggregatedExtraction).
#[derive(Error, Debug)]
pub enum FidocError {
    /// No provider could be paid for within the configured ceilings.
    /// Recoverable: the caller may queue the document for later.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(BudgetViolation),

    /// Every provider in the fallback chain failed.
    #[error("no provider available (attempted: {})", attempted.join(", "))]
    ProviderUnavailable { attempted: Vec<String> },

    /// The input cannot be processed (unreadable, unsupported format, too large).
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    /// Processing was cancelled before a provider call was sent.
    #[error("processing cancelled")]
    Cancelled,

    /// The budget store failed.
    #[error("budget store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FidocError {
    /// Whether retrying the same document later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FidocError::BudgetExceeded(_) | FidocError::Store(_) | FidocError::Cancelled
        )
    }
}

/// Result type for the fidoc library.
pub type Result<T> = std::result::Result<T, FidocError>;
