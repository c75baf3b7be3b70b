//! Heuristic document type classification.

pub mod rules;

pub use rules::{TypeRule, WeightedPattern, DEFAULT_RULES};

use tracing::debug;

use crate::models::config::ClassifierConfig;
use crate::models::document::{DocumentClassification, DocumentType};

/// Rule-table document classifier.
///
/// Pure: holds no mutable state, so one instance can be shared across
/// threads and identical input always yields identical output.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    rules: Vec<TypeRule>,
}

impl Classifier {
    /// Create a classifier with the built-in rule table.
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Append a rule. It is evaluated after the existing ones and so loses ties.
    pub fn with_rule(mut self, rule: TypeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Classify a document from its text and file name.
    pub fn classify(&self, content: &str, file_name: &str) -> DocumentClassification {
        let file_name = file_name.to_lowercase();
        let mut best: Option<DocumentClassification> = None;

        for rule in &self.rules {
            let candidate = self.evaluate(rule, content, &file_name);
            debug!(
                "{} scored {:.2} ({} indicators)",
                candidate.document_type,
                candidate.confidence,
                candidate.indicators.len()
            );

            // Strict comparison: earlier rules win ties.
            if best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }

        match best {
            Some(best) if best.confidence > self.config.min_confidence => best,
            _ => DocumentClassification::new(
                DocumentType::Outro,
                self.config.fallback_confidence,
                vec![format!(
                    "no document type scored above {:.2}",
                    self.config.min_confidence
                )],
            ),
        }
    }

    fn evaluate(&self, rule: &TypeRule, content: &str, file_name: &str) -> DocumentClassification {
        let mut indicators = Vec::new();

        let mut content_score = 0.0f32;
        for pattern in &rule.patterns {
            if pattern.regex.is_match(content) {
                content_score += pattern.weight;
                indicators.push(pattern.description.clone());
            }
        }
        let content_score = content_score.min(1.0);

        let mut confidence = content_score;
        if let Some(keyword) = rule
            .filename_keywords
            .iter()
            .find(|k| file_name.contains(k.as_str()))
        {
            indicators.push(format!("filename contains '{}'", keyword));
            confidence = confidence.max(rule.filename_confidence);
            if content_score > 0.0 {
                confidence += self.config.corroboration_bonus;
            }
        }

        let mut document_type = rule.document_type;
        if let Some(refinement) = &rule.refinement {
            let sub = self.evaluate(refinement, content, file_name);
            if sub.confidence >= self.config.nfce_split {
                document_type = sub.document_type;
                confidence = confidence.max(sub.confidence);
                indicators.extend(sub.indicators);
            }
        }

        DocumentClassification::new(document_type, confidence.min(1.0), indicators)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ACCESS_KEY: &str = "35240111222333000181550010000012341000012345";

    #[test]
    fn test_access_key_label_and_digits_is_nfe() {
        let text = format!("Chave de acesso: {}", ACCESS_KEY);
        let result = Classifier::default().classify(&text, "scan_001.pdf");

        assert_eq!(result.document_type, DocumentType::NFe);
        assert!(result.confidence > 0.3);
        assert!(result.indicators.iter().any(|i| i.contains("access key label")));
    }

    #[test]
    fn test_unrelated_prose_falls_back() {
        let text = "The quick brown fox jumps over the lazy dog near the river bank.";
        let result = Classifier::default().classify(text, "photo.jpg");

        assert_eq!(result.document_type, DocumentType::Outro);
        assert_eq!(result.confidence, 0.1);
        assert_eq!(result.indicators.len(), 1);
    }

    #[test]
    fn test_empty_input_falls_back() {
        let result = Classifier::default().classify("", "");
        assert_eq!(result.document_type, DocumentType::Outro);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = Classifier::default();
        let text = "RECIBO\nRecebi de Fulano a importância de R$ 500,00 referente a aluguel.";

        let first = classifier.classify(text, "recibo_maio.pdf");
        let second = classifier.classify(text, "recibo_maio.pdf");
        assert_eq!(first, second);
        assert_eq!(first.document_type, DocumentType::Recibo);
    }

    #[test]
    fn test_filename_alone_suggests_type() {
        let result = Classifier::default().classify("", "boleto_condominio.pdf");
        assert_eq!(result.document_type, DocumentType::Boleto);
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.indicators, vec!["filename contains 'boleto'".to_string()]);
    }

    #[test]
    fn test_filename_corroborates_content() {
        let result = Classifier::default().classify("Extrato de conta corrente", "extrato_jan.pdf");
        assert_eq!(result.document_type, DocumentType::Extrato);
        // 0.7 from the filename beats 0.6 from content, plus the bonus
        assert!((result.confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_consumer_invoice_is_refined_to_nfce() {
        let text = format!(
            "DANFE NFC-e - Documento Auxiliar da Nota Fiscal de Consumidor Eletrônica\n\
             Consulte pela Chave de Acesso\n{}\nCONSUMIDOR NÃO IDENTIFICADO",
            ACCESS_KEY
        );
        let result = Classifier::default().classify(&text, "cupom.png");

        assert_eq!(result.document_type, DocumentType::NFCe);
        assert!(result.indicators.iter().any(|i| i.contains("NFC-e")));
    }

    #[test]
    fn test_nfce_split_is_configurable() {
        let config = ClassifierConfig {
            nfce_split: 0.95,
            ..Default::default()
        };
        let text = format!("Chave de acesso {} NFC-e", ACCESS_KEY);
        let result = Classifier::new(config).classify(&text, "");
        assert_eq!(result.document_type, DocumentType::NFe);
    }

    #[test]
    fn test_payroll_slip() {
        let text = "Recibo de Pró-labore\nSócio: Maria\nINSS 11%\nIRRF retido";
        let result = Classifier::default().classify(text, "");
        assert_eq!(result.document_type, DocumentType::ProLabore);
    }

    #[test]
    fn test_content_score_is_capped() {
        let text = "Contrato de prestação. Cláusula 1. CONTRATANTE e CONTRATADA. Vigência. Foro.";
        let result = Classifier::default().classify(text, "contrato.pdf");
        assert_eq!(result.document_type, DocumentType::Contrato);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_ties_go_to_first_rule() {
        // Both custom rules score 0.5; the first one registered must win.
        let first = TypeRule::new(
            DocumentType::Contrato,
            vec![WeightedPattern::new("zzz", 0.5, "first").unwrap()],
            &[],
            0.6,
        );
        let second = TypeRule::new(
            DocumentType::Extrato,
            vec![WeightedPattern::new("zzz", 0.5, "second").unwrap()],
            &[],
            0.6,
        );
        let classifier = Classifier {
            config: ClassifierConfig::default(),
            rules: vec![first, second],
        };

        let result = classifier.classify("zzz", "");
        assert_eq!(result.document_type, DocumentType::Contrato);
    }

    #[test]
    fn test_custom_rule_extends_table() {
        let rule = TypeRule::new(
            DocumentType::Outro,
            vec![WeightedPattern::new(r"(?i)guia\s+GPS", 0.9, "GPS slip").unwrap()],
            &[],
            0.6,
        );
        let classifier = Classifier::default().with_rule(rule);
        let result = classifier.classify("Guia GPS competência 01/2024", "");
        assert_eq!(result.indicators, vec!["GPS slip".to_string()]);
    }
}
