//! Final structured output of the pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fidoc_provider::ExtractedFields;

use super::document::DocumentClassification;
use crate::provider::strategy::DocumentCategory;

/// What downstream automation should do with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Confidence meets the category's required quality.
    Accepted,
    /// Usable, but a human should look at it.
    NeedsReview,
    /// Below the low-water mark. Still returned with diagnostics.
    Rejected,
}

/// A validated, confidence-scored extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedExtraction {
    /// Extracted fields (provider output plus any text backfill).
    pub fields: ExtractedFields,

    /// Raw text returned by the provider.
    pub raw_text: String,

    /// Type detection outcome.
    pub classification: DocumentClassification,

    /// Strategy bucket used for provider selection and the verdict threshold.
    pub category: DocumentCategory,

    /// Confidence reported by the provider.
    pub provider_confidence: f32,

    /// Provider confidence adjusted by validation, clamped to [0, 1].
    pub final_confidence: f32,

    /// Outcome of the verdict policy.
    pub verdict: Verdict,

    /// Validation errors.
    pub validation_errors: Vec<String>,

    /// Validation and pipeline warnings.
    pub validation_warnings: Vec<String>,

    /// Provider whose output was used.
    pub provider: String,

    /// Every provider that was called, in order.
    pub attempted_providers: Vec<String>,

    /// Amount charged against the budget.
    pub cost: Decimal,
}

impl AggregatedExtraction {
    /// Whether all field checks passed.
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}
