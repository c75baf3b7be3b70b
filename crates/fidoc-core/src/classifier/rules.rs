//! Weighted indicator tables for each document type.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::document::DocumentType;

/// A content indicator and the score it contributes when it matches.
#[derive(Debug, Clone)]
pub struct WeightedPattern {
    /// Pattern matched against the document text.
    pub regex: Regex,
    /// Score added on match.
    pub weight: f32,
    /// Reason reported in the classification indicators.
    pub description: String,
}

impl WeightedPattern {
    /// Compile a weighted pattern.
    pub fn new(
        pattern: &str,
        weight: f32,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            weight,
            description: description.into(),
        })
    }
}

/// Everything the classifier knows about one document type.
#[derive(Debug, Clone)]
pub struct TypeRule {
    /// Type reported when this rule wins.
    pub document_type: DocumentType,
    /// Content indicators, in evaluation order.
    pub patterns: Vec<WeightedPattern>,
    /// Lowercase filename fragments that suggest this type on their own.
    pub filename_keywords: Vec<String>,
    /// Confidence given by a filename hit.
    pub filename_confidence: f32,
    /// Sub-type that replaces this one when its own score reaches the split threshold.
    pub refinement: Option<Box<TypeRule>>,
}

impl TypeRule {
    /// Create a rule without a refinement.
    pub fn new(
        document_type: DocumentType,
        patterns: Vec<WeightedPattern>,
        filename_keywords: &[&str],
        filename_confidence: f32,
    ) -> Self {
        Self {
            document_type,
            patterns,
            filename_keywords: filename_keywords.iter().map(|k| k.to_string()).collect(),
            filename_confidence,
            refinement: None,
        }
    }

    /// Attach a sub-type rule.
    pub fn with_refinement(mut self, refinement: TypeRule) -> Self {
        self.refinement = Some(Box::new(refinement));
        self
    }
}

fn wp(pattern: &str, weight: f32, description: &str) -> WeightedPattern {
    WeightedPattern::new(pattern, weight, description).unwrap()
}

lazy_static! {
    /// Built-in rules in evaluation order. Order is the tie-break.
    pub static ref DEFAULT_RULES: Vec<TypeRule> = vec![
        TypeRule::new(
            DocumentType::NFe,
            vec![
                wp(r"(?i)chave\s+de\s+acesso", 0.4, "access key label"),
                wp(r"(?i)nota\s+fiscal\s+eletr[oô]nica", 0.4, "'nota fiscal eletrônica' header"),
                wp(r"\b(?:\d{4}\s?){10}\d{4}\b", 0.3, "44-digit access key"),
                wp(r"(?i)\bDANFE\b", 0.3, "DANFE header"),
                wp(r"(?i)protocolo\s+de\s+autoriza[cç][aã]o", 0.2, "authorization protocol"),
                wp(r"(?i)\bNF-?e\b", 0.2, "NF-e keyword"),
                wp(r"(?i)\bCFOP\b", 0.1, "CFOP code"),
            ],
            &["nfe", "nf-e", "danfe", "nota_fiscal", "nota-fiscal", "notafiscal"],
            0.7,
        )
        .with_refinement(TypeRule::new(
            DocumentType::NFCe,
            vec![
                wp(r"(?i)\bNFC-?e\b", 0.4, "NFC-e keyword"),
                wp(r"(?i)nota\s+fiscal\s+(?:eletr[oô]nica\s+)?de\s+consumidor", 0.4, "consumer invoice header"),
                wp(r"(?i)consumidor\s+(?:n[aã]o\s+)?identificado", 0.2, "consumer identification line"),
                wp(r"(?i)consulte\s+pela\s+chave", 0.1, "consumer lookup instructions"),
            ],
            &["nfce", "nfc-e"],
            0.7,
        )),
        TypeRule::new(
            DocumentType::ProLabore,
            vec![
                wp(r"(?i)pr[oó][\s-]?labore", 0.5, "'pró-labore' keyword"),
                wp(r"(?i)retirada\s+(?:de\s+)?s[oó]cios?", 0.2, "partner withdrawal"),
                wp(r"(?i)\bINSS\b", 0.2, "INSS contribution"),
                wp(r"(?i)\bIRRF\b", 0.15, "IRRF withholding"),
                wp(r"(?i)\bs[oó]cio", 0.15, "partner reference"),
                wp(r"(?i)remunera[cç][aã]o", 0.1, "remuneration"),
            ],
            &["pro_labore", "pro-labore", "prolabore", "pró-labore"],
            0.7,
        ),
        TypeRule::new(
            DocumentType::Recibo,
            vec![
                wp(r"(?i)\brecibo\b", 0.4, "'recibo' header"),
                wp(r"(?i)recebi(?:\s+de|mos\s+de)", 0.3, "'recebi de' statement"),
                wp(r"(?i)a\s+import[aâ]ncia\s+de", 0.3, "'a importância de' amount phrase"),
                wp(r"(?i)referente\s+a", 0.15, "'referente a' purpose"),
                wp(r"(?i)quita[cç][aã]o", 0.15, "discharge clause"),
            ],
            &["recibo"],
            0.6,
        ),
        TypeRule::new(
            DocumentType::Boleto,
            vec![
                wp(r"(?i)linha\s+digit[aá]vel", 0.4, "'linha digitável' label"),
                wp(
                    r"\b\d{5}\.\d{5}\s+\d{5}\.\d{6}\s+\d{5}\.\d{6}\s+\d\s+\d{14}\b",
                    0.4,
                    "typeable line",
                ),
                wp(r"(?i)\bboleto\b", 0.3, "'boleto' keyword"),
                wp(r"(?i)nosso\s+n[uú]mero", 0.2, "'nosso número' field"),
                wp(r"(?i)\b(?:cedente|benefici[aá]rio)\b", 0.15, "payee field"),
                wp(r"(?i)\bvencimento\b", 0.1, "due date field"),
            ],
            &["boleto"],
            0.7,
        ),
        TypeRule::new(
            DocumentType::Contrato,
            vec![
                wp(r"(?i)\bcontrato\b", 0.3, "'contrato' keyword"),
                wp(r"(?i)cl[aá]usula", 0.3, "clause numbering"),
                wp(r"(?i)\bcontratante\b", 0.2, "contracting party"),
                wp(r"(?i)\bcontratad[ao]\b", 0.2, "contracted party"),
                wp(r"(?i)\bvig[eê]ncia\b", 0.1, "term of validity"),
                wp(r"(?i)\bforo\b", 0.1, "jurisdiction clause"),
            ],
            &["contrato"],
            0.6,
        ),
        TypeRule::new(
            DocumentType::Extrato,
            vec![
                wp(r"(?i)\bextrato\b", 0.4, "'extrato' header"),
                wp(r"(?i)saldo\s+(?:anterior|final|atual|dispon[ií]vel)", 0.3, "balance line"),
                wp(r"(?i)conta\s+corrente", 0.2, "checking account"),
                wp(r"(?i)lan[cç]amentos", 0.15, "entries table"),
                wp(r"(?i)\bag[eê]ncia\b", 0.1, "branch field"),
                wp(r"(?i)\b(?:d[eé]bito|cr[eé]dito)\b", 0.1, "debit/credit column"),
            ],
            &["extrato"],
            0.7,
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_cover_every_specific_type() {
        let types: Vec<DocumentType> = DEFAULT_RULES.iter().map(|r| r.document_type).collect();
        assert_eq!(
            types,
            vec![
                DocumentType::NFe,
                DocumentType::ProLabore,
                DocumentType::Recibo,
                DocumentType::Boleto,
                DocumentType::Contrato,
                DocumentType::Extrato,
            ]
        );
    }

    #[test]
    fn test_weights_are_positive() {
        for rule in DEFAULT_RULES.iter() {
            for pattern in &rule.patterns {
                assert!(pattern.weight > 0.0, "{}", pattern.description);
            }
            assert!(rule.filename_confidence >= 0.6 && rule.filename_confidence <= 0.7);
        }
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(WeightedPattern::new(r"(unclosed", 0.1, "broken").is_err());
    }
}
