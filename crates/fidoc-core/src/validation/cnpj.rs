//! CNPJ (Brazilian legal-entity tax ID) validation.

use crate::models::config::Adjustments;

use super::{check_digit, digits_of, ValidationResult};

const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Check a CNPJ's length and both mod-11 check digits.
///
/// Formatting characters are ignored: `11.222.333/0001-81` and
/// `11222333000181` are equivalent.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let digits = digits_of(cnpj);
    if digits.len() != 14 {
        return false;
    }

    check_digit(&digits[..12], &FIRST_WEIGHTS) == digits[12]
        && check_digit(&digits[..13], &SECOND_WEIGHTS) == digits[13]
}

/// Validate a CNPJ and score the outcome.
pub fn validate_cnpj(cnpj: &str, adjustments: &Adjustments) -> ValidationResult {
    let mut result = ValidationResult::new();
    let digits = digits_of(cnpj);

    if digits.len() != 14 {
        result.error(
            format!("CNPJ must have 14 digits, found {}", digits.len()),
            adjustments.tax_id_invalid,
        );
    } else if !is_valid_cnpj(cnpj) {
        result.error("CNPJ check digits do not match", adjustments.tax_id_invalid);
    } else {
        result.bonus(adjustments.tax_id_valid);
    }

    result
}

/// Format a CNPJ as `XX.XXX.XXX/XXXX-XX`.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits: String = cnpj.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 14 {
        return cnpj.to_string();
    }

    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_cnpj() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11222333000181"));
        assert!(is_valid_cnpj("11 444 777 0001 61"));
    }

    #[test]
    fn test_corrupted_check_digit_is_invalid() {
        assert!(!is_valid_cnpj("11.222.333/0001-82")); // second digit
        assert!(!is_valid_cnpj("11.222.333/0001-91")); // first digit
        assert!(!is_valid_cnpj("1122233300018")); // too short
        assert!(!is_valid_cnpj("112223330001811")); // too long
    }

    #[test]
    fn test_validate_cnpj_scores() {
        let adj = Adjustments::default();

        let ok = validate_cnpj("11.222.333/0001-81", &adj);
        assert!(ok.is_valid);
        assert!((ok.confidence_adjustment - 0.1).abs() < 1e-6);

        let bad = validate_cnpj("11.222.333/0001-80", &adj);
        assert!(!bad.is_valid);
        assert!((bad.confidence_adjustment + 0.3).abs() < 1e-6);
        assert_eq!(bad.errors.len(), 1);
    }

    #[test]
    fn test_validate_cnpj_length() {
        let result = validate_cnpj("123", &Adjustments::default());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("14 digits"));
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("11.222.333/0001-81"), "11.222.333/0001-81");
        assert_eq!(format_cnpj("123"), "123");
    }
}
