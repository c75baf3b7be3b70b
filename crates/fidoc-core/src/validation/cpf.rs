//! CPF (Brazilian individual tax ID) validation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::config::Adjustments;

use super::{check_digit, digits_of, ValidationResult};

const FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

lazy_static! {
    // Every digit the same: passes the checksum but is never issued.
    static ref REPEATED_DIGITS: Regex = Regex::new(
        r"^(?:0{11}|1{11}|2{11}|3{11}|4{11}|5{11}|6{11}|7{11}|8{11}|9{11})$"
    ).unwrap();
}

/// Check a CPF's length, repeated-digit structure and both check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits = digits_of(cpf);
    if digits.len() != 11 || has_repeated_digits(cpf) {
        return false;
    }

    check_digit(&digits[..9], &FIRST_WEIGHTS) == digits[9]
        && check_digit(&digits[..10], &SECOND_WEIGHTS) == digits[10]
}

fn has_repeated_digits(cpf: &str) -> bool {
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();
    REPEATED_DIGITS.is_match(&digits)
}

/// Validate a CPF and score the outcome.
pub fn validate_cpf(cpf: &str, adjustments: &Adjustments) -> ValidationResult {
    let mut result = ValidationResult::new();
    let digits = digits_of(cpf);

    if digits.len() != 11 {
        result.error(
            format!("CPF must have 11 digits, found {}", digits.len()),
            adjustments.tax_id_invalid,
        );
    } else if has_repeated_digits(cpf) {
        result.error("CPF is invalid: all digits equal", adjustments.tax_id_invalid);
    } else if !is_valid_cpf(cpf) {
        result.error("CPF check digits do not match", adjustments.tax_id_invalid);
    } else {
        result.bonus(adjustments.tax_id_valid);
    }

    result
}

/// Format a CPF as `XXX.XXX.XXX-XX`.
pub fn format_cpf(cpf: &str) -> String {
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 11 {
        return cpf.to_string();
    }

    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_cpf() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("11144477735"));
    }

    #[test]
    fn test_corrupted_check_digit_is_invalid() {
        assert!(!is_valid_cpf("529.982.247-24"));
        assert!(!is_valid_cpf("529.982.247-15"));
        assert!(!is_valid_cpf("5299822472"));
    }

    #[test]
    fn test_all_equal_digits_rejected() {
        // Passes the checksum, rejected structurally.
        assert!(!is_valid_cpf("11111111111"));

        let result = validate_cpf("11111111111", &Adjustments::default());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("all digits equal"));
        assert!((result.confidence_adjustment + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_validate_cpf_valid() {
        let result = validate_cpf("111.444.777-35", &Adjustments::default());
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert!(result.confidence_adjustment >= 0.0);
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("1234"), "1234");
    }
}
