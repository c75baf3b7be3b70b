//! Common regex patterns for Brazilian fiscal document text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // CNPJ patterns (legal-entity tax ID)
    pub static ref CNPJ_LABELED: Regex = Regex::new(
        r"(?i)CNPJ(?:/MF)?[\s:nº°.]*(\d{2})\.?(\d{3})\.?(\d{3})/?(\d{4})-?(\d{2})"
    ).unwrap();

    pub static ref CNPJ_STANDALONE: Regex = Regex::new(
        r"\b(\d{2})\.(\d{3})\.(\d{3})/(\d{4})-(\d{2})\b"
    ).unwrap();

    // CPF pattern (individual tax ID)
    pub static ref CPF_PATTERN: Regex = Regex::new(
        r"\b(\d{3})\.?(\d{3})\.?(\d{3})-?(\d{2})\b"
    ).unwrap();

    pub static ref CPF_LABELED: Regex = Regex::new(
        r"(?i)CPF[\s:nº°.]*(\d{3})\.?(\d{3})\.?(\d{3})-?(\d{2})"
    ).unwrap();

    // NFe access key: 44 digits, optionally in groups of four
    pub static ref ACCESS_KEY: Regex = Regex::new(
        r"\b((?:\d{4}[\s.]?){10}\d{4})\b"
    ).unwrap();

    // Date patterns
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // Labeled dates
    pub static ref ISSUE_DATE: Regex = Regex::new(
        r"(?i)(?:data\s+(?:de\s+|da\s+)?emiss[aã]o|emitid[ao]\s+em|data\s+do\s+documento)[\s:]*(.+?)(?:\n|$)"
    ).unwrap();

    pub static ref DUE_DATE: Regex = Regex::new(
        r"(?i)(?:data\s+de\s+vencimento|vencimento|vence\s+em|pag[aá]vel\s+at[eé])[\s:]*(.+?)(?:\n|$)"
    ).unwrap();

    // Amount patterns (Brazilian format: 1.234,56)
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(\d{1,3}(?:\.?\d{3})*),(\d{2})\b"
    ).unwrap();

    // Totals
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)(?:valor\s+total(?:\s+da\s+nota)?|total\s+a\s+pagar|valor\s+do\s+documento|valor\s+cobrado|total\s+bruto)[\s:R$]*(-?\d{1,3}(?:\.?\d{3})*,\d{2})"
    ).unwrap();

    pub static ref NET_AMOUNT: Regex = Regex::new(
        r"(?i)(?:valor\s+l[ií]quido|l[ií]quido\s+a\s+receber|total\s+l[ií]quido)[\s:R$]*(-?\d{1,3}(?:\.?\d{3})*,\d{2})"
    ).unwrap();

    // Document number
    pub static ref DOCUMENT_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:n[uú]mero|n[º°o]\.?)\s*(?:da\s+nota|do\s+documento|do\s+recibo)?[\s:]*(\d[\d./\-]*\d|\d)"
    ).unwrap();

    // Party sections
    pub static ref ISSUER_SECTION: Regex = Regex::new(
        r"(?i)(?:emitente|prestador(?:\s+de\s+servi[cç]os)?|cedente|benefici[aá]rio)[\s:]*"
    ).unwrap();

    pub static ref RECIPIENT_SECTION: Regex = Regex::new(
        r"(?i)(?:destinat[aá]rio|tomador(?:\s+de\s+servi[cç]os)?|sacado|pagador)[\s:]*"
    ).unwrap();
}
