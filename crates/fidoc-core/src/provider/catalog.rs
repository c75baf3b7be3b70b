//! Static registry of extraction providers.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FidocError;

/// Request limits imposed by a provider. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests per rolling minute.
    pub per_minute: Option<u32>,
    /// Requests per calendar day.
    pub per_day: Option<u32>,
}

/// Capability, cost and quality profile of an extraction backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique name; providers are registered with the orchestrator under it.
    pub name: String,

    /// Disabled providers are never selected.
    pub enabled: bool,

    /// Lower is preferred.
    pub priority: u32,

    /// Cost of one request for one page.
    pub cost_per_request: Decimal,

    /// Largest accepted file in bytes.
    pub max_file_size: u64,

    /// Accepted lowercase file extensions.
    pub supported_formats: BTreeSet<String>,

    /// Request limits.
    #[serde(default)]
    pub rate_limit: RateLimit,

    /// Extraction quality on a 1-10 scale.
    pub quality_score: u8,
}

const MB: u64 = 1024 * 1024;

impl ProviderConfig {
    /// Whether `quality_score / 10` reaches `required`.
    pub fn meets_quality(&self, required: f32) -> bool {
        // compared on the 1-10 scale so 0.9 and 9/10 agree
        f32::from(self.quality_score) + 1e-4 >= required * 10.0
    }

    /// Whether a file of `size` bytes is accepted.
    pub fn fits_size(&self, size: u64) -> bool {
        size <= self.max_file_size
    }

    /// Whether the extension is accepted. Unknown extensions are not rejected here.
    pub fn supports(&self, extension: Option<&str>) -> bool {
        extension.is_none_or(|ext| self.supported_formats.contains(ext))
    }

    /// Quality as a 0-1 fraction.
    pub fn quality(&self) -> f32 {
        f32::from(self.quality_score) / 10.0
    }

    fn check(&self) -> Result<(), FidocError> {
        if !(1..=10).contains(&self.quality_score) {
            return Err(FidocError::Config(format!(
                "provider '{}' quality score {} outside [1, 10]",
                self.name, self.quality_score
            )));
        }
        if self.cost_per_request < Decimal::ZERO {
            return Err(FidocError::Config(format!(
                "provider '{}' has negative cost",
                self.name
            )));
        }
        Ok(())
    }
}

/// Read-only table of providers.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderConfig>,
}

impl ProviderCatalog {
    /// Build a catalog, rejecting invalid or duplicate entries.
    pub fn new(providers: Vec<ProviderConfig>) -> Result<Self, FidocError> {
        for (i, provider) in providers.iter().enumerate() {
            provider.check()?;
            if providers[..i].iter().any(|p| p.name == provider.name) {
                return Err(FidocError::Config(format!(
                    "provider '{}' registered twice",
                    provider.name
                )));
            }
        }
        Ok(Self { providers })
    }

    /// Built-in provider profiles.
    pub fn default_providers() -> Vec<ProviderConfig> {
        let formats = |list: &[&str]| list.iter().map(|f| f.to_string()).collect();

        vec![
            ProviderConfig {
                name: "openai_vision".to_string(),
                enabled: true,
                priority: 1,
                cost_per_request: Decimal::new(1, 2),
                max_file_size: 20 * MB,
                supported_formats: formats(&["pdf", "png", "jpg", "jpeg", "webp", "gif"]),
                rate_limit: RateLimit {
                    per_minute: Some(60),
                    per_day: Some(10_000),
                },
                quality_score: 9,
            },
            ProviderConfig {
                name: "google_vision".to_string(),
                enabled: true,
                priority: 2,
                cost_per_request: Decimal::new(15, 4),
                max_file_size: 20 * MB,
                supported_formats: formats(&[
                    "pdf", "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff",
                ]),
                rate_limit: RateLimit {
                    per_minute: Some(1_800),
                    per_day: None,
                },
                quality_score: 8,
            },
            ProviderConfig {
                name: "tesseract".to_string(),
                enabled: true,
                priority: 3,
                cost_per_request: Decimal::ZERO,
                max_file_size: 50 * MB,
                supported_formats: formats(&["pdf", "png", "jpg", "jpeg", "bmp", "tif", "tiff"]),
                rate_limit: RateLimit::default(),
                quality_score: 6,
            },
        ]
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Enabled providers, in table order.
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Cheapest enabled provider matching `filter`; ties go to the lower priority.
    pub fn cheapest<F>(&self, filter: F) -> Option<&ProviderConfig>
    where
        F: Fn(&ProviderConfig) -> bool,
    {
        self.enabled()
            .filter(|p| filter(p))
            .min_by(|a, b| {
                a.cost_per_request
                    .cmp(&b.cost_per_request)
                    .then(a.priority.cmp(&b.priority))
            })
    }

    /// Whether any enabled provider accepts the extension.
    pub fn supports_format(&self, extension: &str) -> bool {
        self.enabled()
            .any(|p| p.supported_formats.contains(extension))
    }

    /// All providers, in table order.
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self {
            providers: Self::default_providers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = ProviderCatalog::default();
        assert_eq!(catalog.enabled().count(), 3);
        assert_eq!(catalog.get("tesseract").unwrap().cost_per_request, Decimal::ZERO);
        assert!(catalog.get("azure").is_none());
    }

    #[test]
    fn test_meets_quality_at_boundary() {
        let catalog = ProviderCatalog::default();
        let openai = catalog.get("openai_vision").unwrap();
        assert!(openai.meets_quality(0.9));
        assert!(!openai.meets_quality(0.95));
        assert!((openai.quality() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_cheapest() {
        let catalog = ProviderCatalog::default();
        let cheapest = catalog.cheapest(|_| true).unwrap();
        assert_eq!(cheapest.name, "tesseract");

        let cheapest_hosted = catalog.cheapest(|p| p.quality_score >= 8).unwrap();
        assert_eq!(cheapest_hosted.name, "google_vision");
    }

    #[test]
    fn test_rejects_invalid_entries() {
        let mut providers = ProviderCatalog::default_providers();
        providers[0].quality_score = 11;
        assert!(ProviderCatalog::new(providers).is_err());

        let mut providers = ProviderCatalog::default_providers();
        providers[1].cost_per_request = Decimal::new(-1, 2);
        assert!(ProviderCatalog::new(providers).is_err());

        let mut providers = ProviderCatalog::default_providers();
        providers[2].name = "openai_vision".to_string();
        assert!(ProviderCatalog::new(providers).is_err());
    }

    #[test]
    fn test_format_support() {
        let catalog = ProviderCatalog::default();
        assert!(catalog.supports_format("tiff"));
        assert!(!catalog.supports_format("docx"));
        assert!(catalog.get("openai_vision").unwrap().supports(None));
        assert!(!catalog.get("openai_vision").unwrap().supports(Some("tiff")));
    }
}
