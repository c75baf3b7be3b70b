//! NFe access key (chave de acesso) validation.
//!
//! Layout of the 44 digits:
//! `UF(2) AAMM(4) CNPJ(14) modelo(2) série(3) número(9) tpEmis(1) código(8) DV(1)`

use crate::models::config::Adjustments;

use super::{digits_of, ValidationResult};

/// Expected number of digits in an access key.
pub const ACCESS_KEY_LEN: usize = 44;

const DV_WEIGHTS: [u32; 8] = [2, 3, 4, 5, 6, 7, 8, 9];

/// Compute the mod-11 verifier digit over the first 43 digits.
///
/// Weights 2..9 are applied cyclically starting from the rightmost digit.
pub fn access_key_check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip(DV_WEIGHTS.iter().cycle())
        .map(|(d, w)| d * w)
        .sum();

    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Validate an access key's length and structure.
///
/// `issuer_cnpj` is compared against the CNPJ embedded in the key when given.
pub fn validate_access_key(
    key: &str,
    issuer_cnpj: Option<&str>,
    adjustments: &Adjustments,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let digits = digits_of(key);

    if digits.len() != ACCESS_KEY_LEN {
        result.error(
            format!(
                "access key must have {} digits, found {}",
                ACCESS_KEY_LEN,
                digits.len()
            ),
            adjustments.access_key_malformed,
        );
        return result;
    }

    result.bonus(adjustments.access_key_present);
    let penalty = adjustments.access_key_violation;

    let number = |range: std::ops::Range<usize>| {
        digits[range].iter().fold(0u32, |acc, d| acc * 10 + d)
    };

    let uf = number(0..2);
    if !(11..=53).contains(&uf) {
        result.warning(format!("access key UF code {:02} is out of range", uf), penalty);
    }

    let year = number(2..4);
    if !(8..=99).contains(&year) {
        result.warning(format!("access key year {:02} is out of range", year), penalty);
    }

    let month = number(4..6);
    if !(1..=12).contains(&month) {
        result.warning(format!("access key month {:02} is out of range", month), penalty);
    }

    if access_key_check_digit(&digits[..43]) != digits[43] {
        result.warning("access key check digit does not match", penalty);
    }

    if let Some(cnpj) = issuer_cnpj {
        let cnpj = digits_of(cnpj);
        if cnpj.len() == 14 && cnpj[..] != digits[6..20] {
            result.warning("access key CNPJ differs from issuer CNPJ", penalty);
        }
    }

    result
}
