//! The provider capability contract.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ProviderOutput, Result};

/// Where the document bytes live.
#[derive(Debug, Clone)]
pub enum FileRef {
    /// A file on local disk (or a mounted object store).
    Path(PathBuf),
    /// The document already loaded in memory.
    Buffer(Vec<u8>),
}

impl FileRef {
    /// Size in bytes when it is known without touching the disk.
    pub fn buffered_len(&self) -> Option<u64> {
        match self {
            FileRef::Path(_) => None,
            FileRef::Buffer(data) => Some(data.len() as u64),
        }
    }
}

/// Per-call options handed to a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Original file name, for providers that dispatch on extension.
    pub file_name: String,

    /// Fine-grained document type hint (e.g. `NFe`, `Recibo`).
    pub document_type: Option<String>,

    /// Number of pages the caller expects to be billed for.
    pub pages: u32,

    /// Call deadline in milliseconds. Providers may use it for their own
    /// transport timeouts; the caller enforces it regardless.
    pub timeout_ms: u64,

    /// Preferred OCR language (ISO 639-1).
    pub language: Option<String>,
}

/// Trait for OCR/extraction providers.
///
/// This trait abstracts over the different extraction backends (hosted
/// vision models, cloud OCR, a local engine) so the orchestrator can walk a
/// fallback chain without knowing any request shape.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Catalog name this provider is registered under.
    fn name(&self) -> &str;

    /// Extract raw text and structured fields from a document.
    ///
    /// # Arguments
    /// * `file` - Document bytes or location
    /// * `options` - Per-call options
    ///
    /// # Returns
    /// Raw text, fields and the provider's own confidence
    async fn extract(&self, file: &FileRef, options: &ExtractOptions) -> Result<ProviderOutput>;
}
