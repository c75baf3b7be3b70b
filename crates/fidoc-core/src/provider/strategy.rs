//! Per-document provider selection.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{ProviderCatalog, ProviderConfig};
use crate::models::config::StrategyConfig;
use crate::models::document::file_extension;

/// Coarse bucket that decides quality requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Invoice,
    Receipt,
    Contract,
    FinancialStatement,
    General,
}

lazy_static! {
    /// Detection order matters: the first bucket whose pattern matches wins.
    static ref CATEGORY_PATTERNS: Vec<(DocumentCategory, Regex)> = vec![
        (
            DocumentCategory::Invoice,
            Regex::new(r"(?i)(?:^|[^a-z])nf-?c?e(?:[^a-z]|$)|danfe|nota[\s_\-]?fiscal|\bfatura\b|invoice|chave\s+de\s+acesso").unwrap(),
        ),
        (
            DocumentCategory::FinancialStatement,
            Regex::new(r"(?i)extrato|balan[cç]o|(?:^|[^a-z])dre(?:[^a-z]|$)|demonstra[cç][aã]o|statement").unwrap(),
        ),
        (
            DocumentCategory::Contract,
            Regex::new(r"(?i)contrato|contract|cl[aá]usula").unwrap(),
        ),
        (
            DocumentCategory::Receipt,
            Regex::new(r"(?i)recibo|receipt|cupom|pr[oó][\s_\-]?labore|comprovante").unwrap(),
        ),
    ];
}

impl DocumentCategory {
    /// Bucket a document by file name, then by content.
    pub fn detect(file_name: &str, content_sample: Option<&str>) -> Self {
        let by_pattern = |text: &str| {
            CATEGORY_PATTERNS
                .iter()
                .find(|(_, re)| re.is_match(text))
                .map(|(category, _)| *category)
        };

        by_pattern(file_name)
            .or_else(|| content_sample.and_then(by_pattern))
            .unwrap_or(DocumentCategory::General)
    }
}

/// Provider decision for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStrategy {
    pub category: DocumentCategory,
    pub provider: String,
    pub quality_requirement: f32,
    pub estimated_cost: Decimal,
    pub pages: u32,
    /// Ordered; never contains `provider`.
    pub fallback_providers: Vec<String>,
    /// False when no provider met every constraint.
    pub quality_guaranteed: bool,
}

/// Chooses a provider for each document from the catalog.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    catalog: Arc<ProviderCatalog>,
    config: StrategyConfig,
}

impl StrategySelector {
    pub fn new(catalog: Arc<ProviderCatalog>, config: StrategyConfig) -> Self {
        Self { catalog, config }
    }

    /// Select a provider for a single-page document.
    pub fn select(
        &self,
        file_name: &str,
        file_size: u64,
        content_sample: Option<&str>,
    ) -> ProcessingStrategy {
        self.select_with_pages(file_name, file_size, content_sample, 1)
    }

    /// Select a provider for a document with a known page count.
    pub fn select_with_pages(
        &self,
        file_name: &str,
        file_size: u64,
        content_sample: Option<&str>,
        pages: u32,
    ) -> ProcessingStrategy {
        let pages = pages.max(1);
        let category = DocumentCategory::detect(file_name, content_sample);
        let profile = self.config.profile(category);
        let required = profile.map(|p| p.required_quality).unwrap_or(0.8);
        let extension = file_extension(file_name);

        let qualifies = |p: &ProviderConfig| {
            p.enabled
                && p.fits_size(file_size)
                && p.meets_quality(required)
                && p.supports(extension.as_deref())
        };

        let preferred = profile
            .and_then(|p| self.catalog.get(&p.preferred_provider))
            .filter(|p| qualifies(p));

        let (chosen, guaranteed) = match preferred.or_else(|| self.best_qualifying(&qualifies)) {
            Some(provider) => (Some(provider), true),
            None => {
                let degraded = self
                    .catalog
                    .cheapest(|p| p.fits_size(file_size) && p.supports(extension.as_deref()))
                    .or_else(|| self.catalog.cheapest(|p| p.fits_size(file_size)))
                    .or_else(|| self.catalog.cheapest(|_| true));
                (degraded, false)
            }
        };

        let (provider, estimated_cost) = match chosen {
            Some(p) => (p.name.clone(), p.cost_per_request * Decimal::from(pages)),
            None => (String::new(), Decimal::ZERO),
        };

        let fallback_providers = self
            .config
            .fallback_chain
            .iter()
            .filter(|name| **name != provider)
            .filter(|name| self.catalog.get(name).is_some_and(|p| p.enabled))
            .cloned()
            .collect();

        debug!(
            "Strategy for {}: {:?} via '{}' (required {:.2}, guaranteed {}, est. {})",
            file_name, category, provider, required, guaranteed, estimated_cost
        );

        ProcessingStrategy {
            category,
            provider,
            quality_requirement: required,
            estimated_cost,
            pages,
            fallback_providers,
            quality_guaranteed: guaranteed,
        }
    }

    fn best_qualifying<F>(&self, qualifies: &F) -> Option<&ProviderConfig>
    where
        F: Fn(&ProviderConfig) -> bool,
    {
        self.catalog.enabled().filter(|p| qualifies(p)).min_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.quality_score.cmp(&a.quality_score))
        })
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MB: u64 = 1024 * 1024;

    fn selector() -> StrategySelector {
        StrategySelector::new(Arc::new(ProviderCatalog::default()), StrategyConfig::default())
    }

    #[test]
    fn test_detect_category() {
        assert_eq!(DocumentCategory::detect("danfe_123.pdf", None), DocumentCategory::Invoice);
        assert_eq!(DocumentCategory::detect("recibo.jpg", None), DocumentCategory::Receipt);
        assert_eq!(
            DocumentCategory::detect("scan.pdf", Some("Extrato de conta corrente")),
            DocumentCategory::FinancialStatement
        );
        assert_eq!(DocumentCategory::detect("scan.pdf", Some("hello")), DocumentCategory::General);
    }

    #[test]
    fn test_invoice_prefers_openai() {
        let strategy = selector().select("nfe_001.pdf", 2 * MB, None);
        assert_eq!(strategy.provider, "openai_vision");
        assert_eq!(strategy.category, DocumentCategory::Invoice);
        assert!(strategy.quality_guaranteed);
        assert_eq!(strategy.estimated_cost, Decimal::new(1, 2));
        assert_eq!(strategy.fallback_providers, vec!["google_vision", "tesseract"]);
    }

    #[test]
    fn test_receipt_prefers_google() {
        let strategy = selector().select("recibo.png", MB, None);
        assert_eq!(strategy.provider, "google_vision");
        assert_eq!(strategy.fallback_providers, vec!["openai_vision", "tesseract"]);
    }

    #[test]
    fn test_large_file_never_gets_small_provider() {
        let strategy = selector().select("nfe_big.pdf", 25 * MB, None);
        assert_eq!(strategy.provider, "tesseract");
        assert!(!strategy.quality_guaranteed);
    }

    #[test]
    fn test_unsupported_extension_skips_preferred() {
        // openai_vision does not take TIFF, google_vision does
        let strategy = selector().select("recibo.tiff", MB, None);
        assert_eq!(strategy.provider, "google_vision");

        let invoice = selector().select("nfe.tiff", MB, None);
        // nothing reaches 0.9 for TIFF, so the cheapest fitting provider is used
        assert_eq!(invoice.provider, "tesseract");
        assert!(!invoice.quality_guaranteed);
    }

    #[test]
    fn test_falls_through_to_priority_order() {
        let mut providers = ProviderCatalog::default_providers();
        providers[1].enabled = false;
        let selector = StrategySelector::new(
            Arc::new(ProviderCatalog::new(providers).unwrap()),
            StrategyConfig::default(),
        );

        let strategy = selector.select("recibo.png", MB, None);
        assert_eq!(strategy.provider, "openai_vision");
        assert!(strategy.quality_guaranteed);
        assert_eq!(strategy.fallback_providers, vec!["tesseract"]);
    }

    #[test]
    fn test_cost_scales_with_pages() {
        let strategy = selector().select_with_pages("nfe.pdf", MB, None, 5);
        assert_eq!(strategy.pages, 5);
        assert_eq!(strategy.estimated_cost, Decimal::new(5, 2));
    }

    #[test]
    fn test_nothing_fits_returns_cheapest() {
        let strategy = selector().select("nfe.pdf", 80 * MB, None);
        assert_eq!(strategy.provider, "tesseract");
        assert!(!strategy.quality_guaranteed);
    }
}
