//! Document-level models: inbound request and classification outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use fidoc_provider::FileRef;

/// Fine-grained fiscal document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Nota Fiscal Eletrônica.
    NFe,
    /// Nota Fiscal de Consumidor Eletrônica.
    NFCe,
    /// Pró-labore payroll slip.
    ProLabore,
    /// Receipt (recibo).
    Recibo,
    /// Bank payment slip.
    Boleto,
    /// Contract.
    Contrato,
    /// Bank statement.
    Extrato,
    /// Anything else.
    Outro,
}

impl DocumentType {
    /// Stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NFe => "NFe",
            Self::NFCe => "NFCe",
            Self::ProLabore => "ProLabore",
            Self::Recibo => "Recibo",
            Self::Boleto => "Boleto",
            Self::Contrato => "Contrato",
            Self::Extrato => "Extrato",
            Self::Outro => "Outro",
        }
    }

    /// Whether the document pays an individual (CPF checks apply).
    pub fn is_payroll(&self) -> bool {
        matches!(self, Self::ProLabore)
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        Self::Outro
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of type detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentClassification {
    /// Detected type.
    #[serde(rename = "type")]
    pub document_type: DocumentType,

    /// Confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Human-readable reasons, in the order they were found.
    pub indicators: Vec<String>,
}

impl DocumentClassification {
    /// Create a classification, clamping the confidence to [0, 1].
    pub fn new(document_type: DocumentType, confidence: f32, indicators: Vec<String>) -> Self {
        Self {
            document_type,
            confidence: confidence.clamp(0.0, 1.0),
            indicators,
        }
    }

    /// Whether this is the generic fallback.
    pub fn is_fallback(&self) -> bool {
        self.document_type == DocumentType::Outro
    }
}

/// A document submitted for processing.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Original file name (extension drives format checks).
    pub file_name: String,

    /// Size in bytes as reported by the intake service.
    pub file_size: u64,

    /// Document bytes or location.
    pub source: FileRef,

    /// Text already known for the document (e.g. from an upload preview).
    pub content_sample: Option<String>,
}

impl RawDocument {
    /// Create a document from an in-memory buffer.
    pub fn from_buffer(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            file_size: data.len() as u64,
            source: FileRef::Buffer(data),
            content_sample: None,
        }
    }

    /// Attach a content sample.
    pub fn with_content_sample(mut self, sample: impl Into<String>) -> Self {
        self.content_sample = Some(sample.into());
        self
    }

    /// Lowercase file extension, if any.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }
}

/// Lowercase extension of a file name.
pub fn file_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_clamps_confidence() {
        let c = DocumentClassification::new(DocumentType::NFe, 1.4, vec!["x".into()]);
        assert_eq!(c.confidence, 1.0);

        let c = DocumentClassification::new(DocumentType::NFe, -0.2, vec![]);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_classification_serializes_type_key() {
        let c = DocumentClassification::new(DocumentType::Outro, 0.1, vec!["none".into()]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "Outro");
        assert_eq!(json["indicators"][0], "none");
    }

    #[test]
    fn test_extension() {
        let doc = RawDocument::from_buffer("Nota_Fiscal.PDF", vec![1, 2, 3]);
        assert_eq!(doc.extension().as_deref(), Some("pdf"));
        assert_eq!(doc.file_size, 3);
        assert_eq!(file_extension("semextensao"), None);
    }
}
