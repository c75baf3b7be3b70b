//! Rule-based field extraction from provider raw text.
//!
//! Providers sometimes return good text but leave structured fields empty.
//! [`backfill`] recovers those fields with the regex extractors in this
//! module, never overwriting what the provider did return.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod tax_ids;

pub use amounts::{extract_amounts, format_brl_amount, parse_brl_amount, AmountExtractor};
pub use dates::{extract_dates, DateExtractor};
pub use tax_ids::{extract_cnpj, AccessKeyExtractor, CnpjExtractor, CpfExtractor};

use tracing::debug;

use fidoc_provider::ExtractedFields;

use patterns::{DOCUMENT_NUMBER, ISSUER_SECTION, RECIPIENT_SECTION};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Fill fields the provider left empty from its raw text.
///
/// Returns one warning per recovered field.
pub fn backfill(fields: &mut ExtractedFields, raw_text: &str) -> Vec<String> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }
    let mut recovered: Vec<&'static str> = Vec::new();

    if fields.issuer_cnpj.is_none() || fields.recipient_cnpj.is_none() {
        let (issuer, recipient) = extract_party_cnpjs(raw_text);
        if fields.issuer_cnpj.is_none() {
            if let Some(cnpj) = issuer {
                fields.issuer_cnpj = Some(cnpj);
                recovered.push("issuer CNPJ");
            }
        }
        if fields.recipient_cnpj.is_none() {
            if let Some(cnpj) = recipient.filter(|r| fields.issuer_cnpj.as_ref() != Some(r)) {
                fields.recipient_cnpj = Some(cnpj);
                recovered.push("recipient CNPJ");
            }
        }
    }

    if fields.beneficiary_cpf.is_none() {
        if let Some(cpf) = CpfExtractor.extract(raw_text) {
            fields.beneficiary_cpf = Some(cpf.value);
            recovered.push("beneficiary CPF");
        }
    }

    if fields.issue_date.is_none() || fields.due_date.is_none() {
        let dates = extract_dates(raw_text);
        if fields.issue_date.is_none() {
            if let Some(date) = dates.issue_date {
                fields.issue_date = Some(date.value.format("%Y-%m-%d").to_string());
                recovered.push("issue date");
            }
        }
        if fields.due_date.is_none() {
            if let Some(date) = dates.due_date {
                fields.due_date = Some(date.value.format("%Y-%m-%d").to_string());
                recovered.push("due date");
            }
        }
    }

    if fields.total_amount.is_none() || fields.net_amount.is_none() {
        let amounts = extract_amounts(raw_text);
        if fields.total_amount.is_none() {
            if let Some(total) = amounts.total {
                fields.total_amount = Some(total.value);
                recovered.push("total amount");
            }
        }
        if fields.net_amount.is_none() {
            if let Some(net) = amounts.net {
                fields.net_amount = Some(net.value);
                recovered.push("net amount");
            }
        }
    }

    if fields.access_key.is_none() {
        if let Some(key) = AccessKeyExtractor.extract(raw_text) {
            fields.access_key = Some(key.value);
            recovered.push("access key");
        }
    }

    if fields.document_number.is_none() {
        if let Some(caps) = DOCUMENT_NUMBER.captures(raw_text) {
            fields.document_number = Some(caps[1].to_string());
            recovered.push("document number");
        }
    }

    debug!("Backfilled {} fields from raw text", recovered.len());

    recovered
        .into_iter()
        .map(|field| format!("{} recovered from raw text", field))
        .collect()
}

/// Assign CNPJs to issuer and recipient using section headers.
fn extract_party_cnpjs(text: &str) -> (Option<String>, Option<String>) {
    let extractor = CnpjExtractor::new();

    let issuer_pos = ISSUER_SECTION.find(text).map(|m| m.start());
    let recipient_pos = RECIPIENT_SECTION.find(text).map(|m| m.start());

    let (issuer_text, recipient_text) = match (issuer_pos, recipient_pos) {
        (Some(i), Some(r)) if i < r => (&text[i..r], &text[r..]),
        (Some(i), Some(r)) => (&text[i..], &text[r..i]),
        (Some(i), None) => (&text[i..], ""),
        (None, Some(r)) => ("", &text[r..]),
        (None, None) => ("", ""),
    };

    let all = extractor.extract_all(text);

    let issuer = extractor
        .extract(issuer_text)
        .map(|m| m.value)
        .or_else(|| all.first().map(|m| m.value.clone()));

    let recipient = extractor
        .extract(recipient_text)
        .map(|m| m.value)
        .or_else(|| all.get(1).map(|m| m.value.clone()));

    (issuer, recipient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const DANFE_TEXT: &str = r#"
        DANFE - DOCUMENTO AUXILIAR DA NOTA FISCAL ELETRÔNICA
        Nº 000.001.234
        CHAVE DE ACESSO
        3524 0111 2223 3300 0181 5500 1000 0012 3410 0001 2349
        DESTINATÁRIO/REMETENTE
        Cliente Exemplo S.A.  CNPJ: 11.444.777/0001-61
        EMITENTE
        Loja Exemplo Ltda  CNPJ: 11.222.333/0001-81
        Data de Emissão: 15/01/2024
        Valor Total da Nota: R$ 1.230,00
    "#;

    #[test]
    fn test_backfill_from_danfe() {
        let mut fields = ExtractedFields::default();
        let warnings = backfill(&mut fields, DANFE_TEXT);

        assert_eq!(fields.issuer_cnpj.as_deref(), Some("11222333000181"));
        assert_eq!(fields.recipient_cnpj.as_deref(), Some("11444777000161"));
        assert_eq!(fields.issue_date.as_deref(), Some("2024-01-15"));
        assert_eq!(fields.total_amount, Some(Decimal::from_str("1230.00").unwrap()));
        assert_eq!(
            fields.access_key.as_deref(),
            Some("35240111222333000181550010000012341000012349")
        );
        assert!(warnings.contains(&"issuer CNPJ recovered from raw text".to_string()));
    }

    #[test]
    fn test_backfill_never_overwrites() {
        let mut fields = ExtractedFields {
            issuer_cnpj: Some("99.999.999/0001-99".into()),
            issue_date: Some("2024-01-20".into()),
            ..Default::default()
        };
        let warnings = backfill(&mut fields, DANFE_TEXT);

        assert_eq!(fields.issuer_cnpj.as_deref(), Some("99.999.999/0001-99"));
        assert_eq!(fields.issue_date.as_deref(), Some("2024-01-20"));
        assert!(!warnings.iter().any(|w| w.starts_with("issuer CNPJ")));
    }

    #[test]
    fn test_backfill_empty_text() {
        let mut fields = ExtractedFields::default();
        assert!(backfill(&mut fields, "   ").is_empty());
        assert!(fields.is_empty());
    }
}
