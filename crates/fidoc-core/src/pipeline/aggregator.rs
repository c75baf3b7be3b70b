//! Final confidence and verdict policy.

use crate::models::extraction::Verdict;
use crate::validation::ValidationResult;

/// Folds validation adjustments into the provider confidence.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceAggregator {
    low_water_mark: f32,
}

impl ConfidenceAggregator {
    pub fn new(low_water_mark: f32) -> Self {
        Self { low_water_mark }
    }

    /// `clamp(provider + adjustment, 0, 1)` and the verdict it earns.
    ///
    /// A non-finite provider confidence counts as 0.
    pub fn aggregate(
        &self,
        provider_confidence: f32,
        validation: &ValidationResult,
        required_quality: f32,
    ) -> (f32, Verdict) {
        let base = if provider_confidence.is_finite() {
            provider_confidence
        } else {
            0.0
        };
        let confidence = (base + validation.confidence_adjustment).clamp(0.0, 1.0);
        let confidence = if confidence.is_nan() { 0.0 } else { confidence };

        let verdict = if confidence >= required_quality {
            Verdict::Accepted
        } else if confidence >= self.low_water_mark {
            Verdict::NeedsReview
        } else {
            Verdict::Rejected
        };

        (confidence, verdict)
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ValidationConfig;
    use crate::models::document::DocumentType;
    use crate::validation::FieldValidator;
    use chrono::NaiveDate;
    use fidoc_provider::ExtractedFields;

    #[test]
    fn test_bonus_and_penalty_cancel_out() {
        let mut validation = ValidationResult::new();
        validation.bonus(0.1);
        validation.warning("issue date is in the future", 0.1);

        let (confidence, verdict) = ConfidenceAggregator::default().aggregate(0.85, &validation, 0.8);
        assert!((confidence - 0.85).abs() < 1e-5);
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn test_verdict_bands() {
        let aggregator = ConfidenceAggregator::default();
        let neutral = ValidationResult::new();

        assert_eq!(aggregator.aggregate(0.9, &neutral, 0.9).1, Verdict::Accepted);
        assert_eq!(aggregator.aggregate(0.7, &neutral, 0.9).1, Verdict::NeedsReview);
        assert_eq!(aggregator.aggregate(0.5, &neutral, 0.9).1, Verdict::NeedsReview);
        assert_eq!(aggregator.aggregate(0.3, &neutral, 0.9).1, Verdict::Rejected);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut penalties = ValidationResult::new();
        penalties.error("bad", 0.8);
        let (low, verdict) = ConfidenceAggregator::default().aggregate(0.4, &penalties, 0.8);
        assert_eq!(low, 0.0);
        assert_eq!(verdict, Verdict::Rejected);

        let mut bonuses = ValidationResult::new();
        bonuses.bonus(0.4);
        let (high, _) = ConfidenceAggregator::default().aggregate(0.9, &bonuses, 0.8);
        assert_eq!(high, 1.0);
    }

    #[test]
    fn test_validated_fields_fold_into_confidence() {
        let validator = FieldValidator::new(ValidationConfig::default())
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let fields = ExtractedFields {
            issuer_cnpj: Some("11.222.333/0001-81".into()),
            issue_date: Some("2024-07-01".into()),
            ..Default::default()
        };

        let validation = validator.validate(&fields, DocumentType::Recibo);
        assert!(validation.is_valid);
        assert_eq!(validation.warnings.len(), 1);

        let (confidence, verdict) = ConfidenceAggregator::default().aggregate(0.85, &validation, 0.8);
        assert!((confidence - 0.85).abs() < 1e-5);
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn test_non_finite_provider_confidence_counts_as_zero() {
        let mut bonus = ValidationResult::new();
        bonus.bonus(0.2);
        let aggregator = ConfidenceAggregator::default();

        let (confidence, verdict) = aggregator.aggregate(f32::NAN, &bonus, 0.8);
        assert!((confidence - 0.2).abs() < 1e-6);
        assert_eq!(verdict, Verdict::Rejected);

        let (confidence, _) = aggregator.aggregate(f32::INFINITY, &ValidationResult::new(), 0.8);
        assert_eq!(confidence, 0.0);
    }
}
