//! Monetary value validation.

use rust_decimal::Decimal;

use crate::models::config::ValidationConfig;

use super::ValidationResult;

/// Validate the gross total and net amount.
pub fn validate_amounts(
    total: Option<Decimal>,
    net: Option<Decimal>,
    config: &ValidationConfig,
) -> ValidationResult {
    let adj = &config.adjustments;
    let mut result = ValidationResult::new();

    if let Some(total) = total {
        if total < Decimal::ZERO {
            result.error(format!("total {} is negative", total), adj.amount_negative);
        } else if total.is_zero() {
            result.warning("total is zero", adj.amount_zero);
        } else if total > Decimal::from(config.max_reasonable_total) {
            result.warning(
                format!("total {} is implausibly large", total),
                adj.amount_too_large,
            );
        }
    }

    if let Some(net) = net {
        if net < Decimal::ZERO {
            result.error(format!("net amount {} is negative", net), adj.amount_negative);
        }
        if let Some(total) = total {
            if net > total {
                result.warning(
                    format!("net amount {} exceeds total {}", net, total),
                    adj.net_above_total,
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_regular_amounts_are_neutral() {
        let result = validate_amounts(d("1230.00"), d("1000.00"), &ValidationConfig::default());
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.confidence_adjustment, 0.0);
    }

    #[test]
    fn test_negative_total() {
        let result = validate_amounts(d("-10.00"), None, &ValidationConfig::default());
        assert!(!result.is_valid);
        assert!(close(result.confidence_adjustment, -0.3));
    }

    #[test]
    fn test_zero_total_warns() {
        let result = validate_amounts(d("0.00"), None, &ValidationConfig::default());
        assert!(result.is_valid);
        assert!(close(result.confidence_adjustment, -0.1));
    }

    #[test]
    fn test_huge_total_warns() {
        let result = validate_amounts(d("1000000000.00"), None, &ValidationConfig::default());
        assert!(result.is_valid);
        assert!(close(result.confidence_adjustment, -0.05));
    }

    #[test]
    fn test_net_above_total_warns() {
        let result = validate_amounts(d("100.00"), d("150.00"), &ValidationConfig::default());
        assert!(result.is_valid);
        assert!(close(result.confidence_adjustment, -0.2));
    }

    #[test]
    fn test_negative_net_is_error() {
        let result = validate_amounts(d("100.00"), d("-1.00"), &ValidationConfig::default());
        assert!(!result.is_valid);
        assert!(close(result.confidence_adjustment, -0.3));
    }

    #[test]
    fn test_missing_amounts_skipped() {
        let result = validate_amounts(None, None, &ValidationConfig::default());
        assert!(result.is_valid);
        assert_eq!(result.confidence_adjustment, 0.0);
    }
}
