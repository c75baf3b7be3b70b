//! Amount extraction for Brazilian-formatted values.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_PATTERN, NET_AMOUNT, TOTAL_AMOUNT};
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                let integer_part = caps[1].replace('.', "");
                let amount = Decimal::from_str(&format!("{}.{}", integer_part, &caps[2])).ok()?;
                Some(ExtractionMatch::new(amount, 0.8, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Labeled amounts found in a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentAmounts {
    /// Gross total (valor total).
    pub total: Option<ExtractionMatch<Decimal>>,
    /// Net amount (valor líquido).
    pub net: Option<ExtractionMatch<Decimal>>,
}

/// Extract labeled amounts from document text.
pub fn extract_amounts(text: &str) -> DocumentAmounts {
    let labeled = |pattern: &regex::Regex| {
        pattern.captures(text).and_then(|caps| {
            let amount = parse_brl_amount(&caps[1])?;
            Some(ExtractionMatch::new(amount, 0.95, &caps[0]))
        })
    };

    DocumentAmounts {
        total: labeled(&TOTAL_AMOUNT),
        net: labeled(&NET_AMOUNT),
    }
}

/// Parse a Brazilian-formatted amount (e.g., "R$ 1.234,56", "1234,56" or "1234.56").
pub fn parse_brl_amount(s: &str) -> Option<Decimal> {
    let negative = s.trim_start().starts_with('-');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // 1.234,56 or 1234,56: comma is the decimal separator
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) => cleaned.replace(',', "."),
        // 1,234.56: comma groups thousands
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // 1.234 with three trailing digits is a thousands group, not cents
        (None, Some(d)) if cleaned.len() - d - 1 == 3 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Format amount in Brazilian style (1.234,56).
pub fn format_brl_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let Some((integer_part, decimal_part)) = s.split_once('.') else {
        return s;
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    format!("{}{},{}", sign, formatted, decimal_part)
}
