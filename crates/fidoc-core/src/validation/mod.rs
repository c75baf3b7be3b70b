//! Field-level validation with confidence adjustment.
//!
//! Every check is a pure function returning a [`ValidationResult`]. The
//! [`FieldValidator`] runs the checks that apply to a document and folds their
//! results into one.

pub mod access_key;
pub mod amounts;
pub mod cnpj;
pub mod cpf;
pub mod dates;

pub use access_key::{validate_access_key, ACCESS_KEY_LEN};
pub use amounts::validate_amounts;
pub use cnpj::{format_cnpj, is_valid_cnpj, validate_cnpj};
pub use cpf::{format_cpf, is_valid_cpf, validate_cpf};
pub use dates::{parse_date, validate_dates};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fidoc_provider::ExtractedFields;

use crate::models::config::ValidationConfig;
use crate::models::document::DocumentType;

/// Outcome of one or more validation checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when no errors were recorded. Warnings do not invalidate.
    pub is_valid: bool,
    /// Problems that make the field untrustworthy.
    pub errors: Vec<String>,
    /// Suspicious but possible values.
    pub warnings: Vec<String>,
    /// Signed delta to apply to the provider confidence.
    pub confidence_adjustment: f32,
}

impl ValidationResult {
    /// An empty, valid result.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            confidence_adjustment: 0.0,
        }
    }

    /// Record an error and its penalty.
    pub fn error(&mut self, message: impl Into<String>, penalty: f32) {
        self.errors.push(message.into());
        self.is_valid = false;
        self.confidence_adjustment -= penalty;
    }

    /// Record a warning and its penalty.
    pub fn warning(&mut self, message: impl Into<String>, penalty: f32) {
        self.warnings.push(message.into());
        self.confidence_adjustment -= penalty;
    }

    /// Record a positive signal.
    pub fn bonus(&mut self, amount: f32) {
        self.confidence_adjustment += amount;
    }

    /// Fold another result into this one, prefixing its messages with `label`.
    pub fn merge(&mut self, label: &str, other: ValidationResult) {
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{}: {}", label, e)));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| format!("{}: {}", label, w)));
        self.confidence_adjustment += other.confidence_adjustment;
        self.is_valid = self.errors.is_empty();
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Digits of a string, ignoring formatting characters.
pub(crate) fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Mod-11 check digit shared by CNPJ and CPF.
pub(crate) fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Runs every applicable check over a set of extracted fields.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    config: ValidationConfig,
    reference_date: Option<NaiveDate>,
}

impl FieldValidator {
    /// Create a validator.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            reference_date: None,
        }
    }

    /// Pin "today" for future-date checks.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Validate all fields that are present.
    pub fn validate(&self, fields: &ExtractedFields, document_type: DocumentType) -> ValidationResult {
        let adj = &self.config.adjustments;
        let mut result = ValidationResult::new();

        if let Some(cnpj) = &fields.issuer_cnpj {
            result.merge("issuer CNPJ", validate_cnpj(cnpj, adj));
        }

        if let Some(cnpj) = &fields.recipient_cnpj {
            result.merge("recipient CNPJ", validate_cnpj(cnpj, adj));
        }

        if document_type.is_payroll() {
            if let Some(cpf) = &fields.beneficiary_cpf {
                result.merge("beneficiary CPF", validate_cpf(cpf, adj));
            }
        }

        let today = self
            .reference_date
            .unwrap_or_else(|| Local::now().date_naive());
        result.merge(
            "dates",
            validate_dates(
                fields.issue_date.as_deref(),
                fields.due_date.as_deref(),
                today,
                &self.config,
            ),
        );

        result.merge(
            "amounts",
            validate_amounts(fields.total_amount, fields.net_amount, &self.config),
        );

        if let Some(key) = &fields.access_key {
            result.merge(
                "access key",
                validate_access_key(key, fields.issuer_cnpj.as_deref(), adj),
            );
        }

        debug!(
            "Validated {} fields: {} errors, {} warnings, adjustment {:+.2}",
            document_type,
            result.errors.len(),
            result.warnings.len(),
            result.confidence_adjustment
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn validator() -> FieldValidator {
        FieldValidator::new(ValidationConfig::default())
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_merge_keeps_validity_in_sync() {
        let mut total = ValidationResult::new();
        let mut warn_only = ValidationResult::new();
        warn_only.warning("odd", 0.1);
        total.merge("a", warn_only);
        assert!(total.is_valid);

        let mut failing = ValidationResult::new();
        failing.error("bad", 0.3);
        total.merge("b", failing);
        assert!(!total.is_valid);
        assert_eq!(total.errors, vec!["b: bad".to_string()]);
        assert_eq!(total.warnings, vec!["a: odd".to_string()]);
    }

    #[test]
    fn test_invoice_fields() {
        let fields = ExtractedFields {
            issuer_cnpj: Some("11.222.333/0001-81".into()),
            recipient_cnpj: Some("11.444.777/0001-61".into()),
            issue_date: Some("2024-01-15".into()),
            due_date: Some("2024-02-15".into()),
            total_amount: Some(Decimal::from_str("1230.00").unwrap()),
            net_amount: Some(Decimal::from_str("1000.00").unwrap()),
            access_key: Some("35240111222333000181550010000012341000012349".into()),
            ..Default::default()
        };

        let result = validator().validate(&fields, DocumentType::NFe);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        // two CNPJ bonuses and the access key bonus
        assert!((result.confidence_adjustment - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_cpf_only_checked_for_payroll() {
        let fields = ExtractedFields {
            beneficiary_cpf: Some("11111111111".into()),
            ..Default::default()
        };

        let receipt = validator().validate(&fields, DocumentType::Recibo);
        assert!(receipt.is_valid);

        let payroll = validator().validate(&fields, DocumentType::ProLabore);
        assert!(!payroll.is_valid);
        assert!(payroll.errors[0].starts_with("beneficiary CPF"));
    }

    #[test]
    fn test_errors_and_warnings_accumulate() {
        let fields = ExtractedFields {
            issuer_cnpj: Some("11.222.333/0001-80".into()),
            issue_date: Some("2024-12-01".into()),
            total_amount: Some(Decimal::ZERO),
            ..Default::default()
        };

        let result = validator().validate(&fields, DocumentType::Recibo);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 2);
        assert!((result.confidence_adjustment + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_empty_fields_are_valid_and_neutral() {
        let result = validator().validate(&ExtractedFields::default(), DocumentType::Outro);
        assert!(result.is_valid);
        assert_eq!(result.confidence_adjustment, 0.0);
    }
}
