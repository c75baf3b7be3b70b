//! CNPJ, CPF and access key extraction from raw text.

use super::patterns::{ACCESS_KEY, CNPJ_LABELED, CNPJ_STANDALONE, CPF_LABELED, CPF_PATTERN};
use super::{ExtractionMatch, FieldExtractor};
use crate::validation::{ACCESS_KEY_LEN, is_valid_cnpj, is_valid_cpf};

/// CNPJ field extractor.
pub struct CnpjExtractor {
    validate: bool,
}

impl CnpjExtractor {
    /// Create a new CNPJ extractor.
    pub fn new() -> Self {
        Self { validate: true }
    }

    /// Set whether to drop candidates with wrong check digits.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for CnpjExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CnpjExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // Labeled pattern first (higher confidence)
        for (confidence, pattern) in [(0.95, &*CNPJ_LABELED), (0.7, &*CNPJ_STANDALONE)] {
            for caps in pattern.captures_iter(text) {
                let cnpj = format!("{}{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]);

                if results.iter().any(|r| r.value == cnpj) {
                    continue;
                }

                if !self.validate || is_valid_cnpj(&cnpj) {
                    if let Some(m) = caps.get(0) {
                        results.push(
                            ExtractionMatch::new(cnpj, confidence, m.as_str())
                                .with_position(m.start(), m.end()),
                        );
                    }
                }
            }
        }

        results
    }
}

/// CPF field extractor. Only checksum-valid candidates are returned.
pub struct CpfExtractor;

impl FieldExtractor for CpfExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for (confidence, pattern) in [(0.95, &*CPF_LABELED), (0.6, &*CPF_PATTERN)] {
            for caps in pattern.captures_iter(text) {
                let cpf = format!("{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4]);

                if results.iter().any(|r| r.value == cpf) || !is_valid_cpf(&cpf) {
                    continue;
                }

                if let Some(m) = caps.get(0) {
                    results.push(
                        ExtractionMatch::new(cpf, confidence, m.as_str())
                            .with_position(m.start(), m.end()),
                    );
                }
            }
        }

        results
    }
}

/// NFe access key extractor.
pub struct AccessKeyExtractor;

impl FieldExtractor for AccessKeyExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        ACCESS_KEY
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(1)?;
                let key: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
                (key.len() == ACCESS_KEY_LEN).then(|| {
                    ExtractionMatch::new(key, 0.9, m.as_str()).with_position(m.start(), m.end())
                })
            })
            .collect()
    }
}

/// Extract the first valid CNPJ from text.
pub fn extract_cnpj(text: &str) -> Option<String> {
    CnpjExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cnpj_labeled() {
        let text = "EMITENTE: Loja Exemplo Ltda\nCNPJ: 11.222.333/0001-81\nSão Paulo";
        assert_eq!(extract_cnpj(text), Some("11222333000181".to_string()));
    }

    #[test]
    fn test_labeled_cnpj_ranks_first() {
        let text = "11.444.777/0001-61 ... CNPJ 11222333000181";
        let results = CnpjExtractor::new().extract_all(text);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].value, "11222333000181");
        assert_eq!(results[0].confidence, 0.95);
    }

    #[test]
    fn test_invalid_cnpj_skipped_unless_disabled() {
        let text = "CNPJ: 11.222.333/0001-80";
        assert!(CnpjExtractor::new().extract(text).is_none());
        assert!(CnpjExtractor::new().with_validation(false).extract(text).is_some());
    }

    #[test]
    fn test_extract_cpf() {
        let text = "Sócio: Maria Souza CPF: 529.982.247-25";
        let cpf = CpfExtractor.extract(text).unwrap();
        assert_eq!(cpf.value, "52998224725");
        assert!(CpfExtractor.extract("CPF: 111.111.111-11").is_none());
    }

    #[test]
    fn test_extract_access_key() {
        let text = "CHAVE DE ACESSO\n3524 0111 2223 3300 0181 5500 1000 0012 3410 0001 2349\n";
        let key = AccessKeyExtractor.extract(text).unwrap();
        assert_eq!(key.value, "35240111222333000181550010000012341000012349");
    }
}
