//! Document intake: format, size and page-count checks before any provider call.

use std::borrow::Cow;

use image::ImageFormat;
use lopdf::Document;
use tracing::{debug, warn};

use fidoc_provider::FileRef;

use crate::error::{FidocError, Result};
use crate::models::document::RawDocument;
use crate::provider::catalog::{ProviderCatalog, ProviderConfig};

/// What intake learned about a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProfile {
    /// Lowercase file extension.
    pub extension: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Page count; 1 for images.
    pub pages: u32,
    /// Caller-supplied sample, or embedded PDF text.
    pub content_sample: Option<String>,
    /// Sniffed image format, for image documents.
    pub image_format: Option<ImageFormat>,
}

impl DocumentProfile {
    /// Whether a provider takes a file of this size and format.
    pub fn accepted_by(&self, provider: &ProviderConfig) -> bool {
        provider.fits_size(self.file_size) && provider.supports(Some(self.extension.as_str()))
    }
}

/// Inspect a document against the provider catalog.
///
/// Fails with [`FidocError::UnsupportedDocument`] when no enabled provider
/// takes the format, the document is empty, or its bytes do not match its
/// extension.
pub async fn inspect(
    doc: &RawDocument,
    catalog: &ProviderCatalog,
    max_sample_chars: usize,
) -> Result<DocumentProfile> {
    let extension = doc.extension().ok_or_else(|| {
        FidocError::UnsupportedDocument(format!("'{}' has no file extension", doc.file_name))
    })?;

    if !catalog.supports_format(&extension) {
        return Err(FidocError::UnsupportedDocument(format!(
            "no provider accepts .{} files",
            extension
        )));
    }

    let loaded;
    let data: &[u8] = match &doc.source {
        FileRef::Buffer(data) => data,
        FileRef::Path(path) => {
            loaded = tokio::fs::read(path).await?;
            &loaded
        }
    };

    let file_size = if doc.file_size > 0 {
        doc.file_size
    } else {
        data.len() as u64
    };
    if file_size == 0 || data.is_empty() {
        return Err(FidocError::UnsupportedDocument(format!(
            "'{}' is empty",
            doc.file_name
        )));
    }

    let mut profile = DocumentProfile {
        extension,
        file_size,
        pages: 1,
        content_sample: doc.content_sample.clone(),
        image_format: None,
    };

    if profile.extension == "pdf" {
        inspect_pdf(data, &mut profile, max_sample_chars)?;
    } else if let Some(expected) = ImageFormat::from_extension(&profile.extension) {
        let sniffed = image::guess_format(data).map_err(|e| {
            FidocError::UnsupportedDocument(format!("'{}' is not an image: {}", doc.file_name, e))
        })?;
        if sniffed != expected {
            return Err(FidocError::UnsupportedDocument(format!(
                "'{}' contains {:?} data",
                doc.file_name, sniffed
            )));
        }
        profile.image_format = Some(sniffed);
    }

    debug!(
        "Intake {}: {} bytes, {} page(s), sample {}",
        doc.file_name,
        profile.file_size,
        profile.pages,
        profile.content_sample.is_some()
    );

    Ok(profile)
}

fn inspect_pdf(data: &[u8], profile: &mut DocumentProfile, max_sample_chars: usize) -> Result<()> {
    let (pdf, text_source) = load_pdf(data)?;

    let pages = pdf.get_pages().len() as u32;
    if pages == 0 {
        return Err(FidocError::UnsupportedDocument("PDF has no pages".to_string()));
    }
    profile.pages = pages;

    if profile.content_sample.is_none() && max_sample_chars > 0 {
        match pdf_extract::extract_text_from_mem(&text_source) {
            Ok(text) if !text.trim().is_empty() => {
                profile.content_sample = Some(text.chars().take(max_sample_chars).collect());
            }
            Ok(_) => debug!("PDF has no embedded text"),
            Err(e) => warn!("Failed to extract PDF text: {}", e),
        }
    }

    Ok(())
}

/// Load a PDF, decrypting it with the empty password when needed.
///
/// Also returns the bytes text extraction should read: the input as is, or
/// the decrypted document re-saved when the input was encrypted.
fn load_pdf(data: &[u8]) -> Result<(Document, Cow<'_, [u8]>)> {
    let mut pdf = Document::load_mem(data)
        .map_err(|e| FidocError::UnsupportedDocument(format!("unreadable PDF: {}", e)))?;

    if !pdf.is_encrypted() {
        return Ok((pdf, Cow::Borrowed(data)));
    }

    if pdf.decrypt("").is_err() {
        return Err(FidocError::UnsupportedDocument(
            "PDF is password protected".to_string(),
        ));
    }
    debug!("Decrypted PDF with empty password");

    let mut decrypted = Vec::new();
    pdf.save_to(&mut decrypted).map_err(|e| {
        FidocError::UnsupportedDocument(format!("failed to save decrypted PDF: {}", e))
    })?;
    Ok((pdf, Cow::Owned(decrypted)))
}
