//! Extraction provider abstraction layer for fidoc.
//!
//! This crate defines the single contract every OCR/vision backend is called
//! through. Concrete backends (hosted vision APIs, a local OCR engine) live
//! outside this workspace and adapt their own request/response shapes to:
//! - [`ExtractionProvider`] for the call itself
//! - [`ProviderOutput`] and [`ExtractedFields`] for what comes back

mod backend;
mod error;
mod output;

pub use backend::{ExtractOptions, ExtractionProvider, FileRef};
pub use error::ProviderError;
pub use output::{ExtractedFields, ProviderOutput};

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
