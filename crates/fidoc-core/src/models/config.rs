//! Configuration structures for the intake pipeline.

use serde::{Deserialize, Serialize};

use crate::error::FidocError;
use crate::provider::budget::BudgetLimits;
use crate::provider::catalog::{ProviderCatalog, ProviderConfig};
use crate::provider::strategy::DocumentCategory;

/// Main configuration for the fidoc pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FidocConfig {
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,

    /// Validator thresholds and confidence adjustments.
    pub validation: ValidationConfig,

    /// Strategy selection configuration.
    pub strategy: StrategyConfig,

    /// Provider catalog.
    #[serde(default = "ProviderCatalog::default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Spending ceilings.
    pub budget: BudgetLimits,

    /// Orchestration configuration.
    pub orchestrator: OrchestratorConfig,
}

impl Default for FidocConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            validation: ValidationConfig::default(),
            strategy: StrategyConfig::default(),
            providers: ProviderCatalog::default_providers(),
            budget: BudgetLimits::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Document classifier configuration.
///
/// The defaults are calibration values, not derived ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// The best score must be strictly above this to avoid the fallback type.
    pub min_confidence: f32,

    /// Confidence reported for the fallback type.
    pub fallback_confidence: f32,

    /// NFC-e marker score at which an NFe-family document is reported as NFCe.
    pub nfce_split: f32,

    /// Added when both the content and the filename point at the same type.
    pub corroboration_bonus: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            fallback_confidence: 0.1,
            nfce_split: 0.4,
            corroboration_bonus: 0.1,
        }
    }
}

/// Field validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Confidence deltas applied per check outcome.
    pub adjustments: Adjustments,

    /// Totals above this are flagged as implausible.
    pub max_reasonable_total: i64,

    /// Issue dates before this year are flagged.
    pub min_issue_year: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            adjustments: Adjustments::default(),
            max_reasonable_total: 999_999_999,
            min_issue_year: 2000,
        }
    }
}

/// Confidence deltas. Penalties are stored as positive magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Bonus for a tax ID with correct check digits.
    pub tax_id_valid: f32,
    /// Penalty for a malformed or wrong-checksum tax ID.
    pub tax_id_invalid: f32,
    /// Penalty for each unparseable date.
    pub date_unparseable: f32,
    /// Penalty for an issue date in the future.
    pub date_in_future: f32,
    /// Penalty for an issue date before `min_issue_year`.
    pub date_too_old: f32,
    /// Penalty for a due date before the issue date.
    pub due_before_issue: f32,
    /// Penalty for a negative amount.
    pub amount_negative: f32,
    /// Penalty for a zero total.
    pub amount_zero: f32,
    /// Penalty for an implausibly large total.
    pub amount_too_large: f32,
    /// Penalty for a net amount above the total.
    pub net_above_total: f32,
    /// Bonus for a well-formed NFe access key.
    pub access_key_present: f32,
    /// Penalty for an access key of the wrong length.
    pub access_key_malformed: f32,
    /// Penalty for each structural problem inside an access key.
    pub access_key_violation: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            tax_id_valid: 0.1,
            tax_id_invalid: 0.3,
            date_unparseable: 0.2,
            date_in_future: 0.1,
            date_too_old: 0.05,
            due_before_issue: 0.3,
            amount_negative: 0.3,
            amount_zero: 0.1,
            amount_too_large: 0.05,
            net_above_total: 0.2,
            access_key_present: 0.2,
            access_key_malformed: 0.4,
            access_key_violation: 0.1,
        }
    }
}

/// Quality requirement and preferred provider for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Category this profile applies to.
    pub category: DocumentCategory,
    /// Minimum `quality_score / 10` a provider must reach.
    pub required_quality: f32,
    /// Provider tried first.
    pub preferred_provider: String,
}

/// Strategy selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Providers tried, in order, after the chosen one fails.
    pub fallback_chain: Vec<String>,

    /// Per-category requirements.
    pub profiles: Vec<CategoryProfile>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        let profile = |category, required_quality, preferred: &str| CategoryProfile {
            category,
            required_quality,
            preferred_provider: preferred.to_string(),
        };

        Self {
            fallback_chain: vec![
                "openai_vision".to_string(),
                "google_vision".to_string(),
                "tesseract".to_string(),
            ],
            profiles: vec![
                profile(DocumentCategory::Invoice, 0.9, "openai_vision"),
                profile(DocumentCategory::Receipt, 0.8, "google_vision"),
                profile(DocumentCategory::Contract, 0.85, "openai_vision"),
                profile(DocumentCategory::FinancialStatement, 0.9, "openai_vision"),
                profile(DocumentCategory::General, 0.8, "google_vision"),
            ],
        }
    }
}

impl StrategyConfig {
    /// Profile for a category, falling back to the `General` one.
    pub fn profile(&self, category: DocumentCategory) -> Option<&CategoryProfile> {
        self.profiles
            .iter()
            .find(|p| p.category == category)
            .or_else(|| self.profiles.iter().find(|p| p.category == DocumentCategory::General))
    }
}

/// Orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Deadline for one provider call in milliseconds.
    pub provider_timeout_ms: u64,

    /// Extra attempts per fallback-chain entry (capped at 1).
    pub max_retries: u32,

    /// Below this final confidence a document is rejected instead of sent to review.
    pub low_water_mark: f32,

    /// Recover fields the provider missed from its raw text.
    pub backfill_from_text: bool,

    /// Maximum characters of embedded PDF text used as a content sample.
    pub max_sample_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 30_000,
            max_retries: 1,
            low_water_mark: 0.5,
            backfill_from_text: true,
            max_sample_chars: 4_000,
        }
    }
}

impl FidocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, FidocError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| FidocError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), FidocError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| FidocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check cross-section consistency.
    pub fn validate(&self) -> Result<(), FidocError> {
        let known = |name: &str| self.providers.iter().any(|p| p.name == name);

        for name in &self.strategy.fallback_chain {
            if !known(name) {
                return Err(FidocError::Config(format!(
                    "fallback chain references unknown provider '{}'",
                    name
                )));
            }
        }

        for profile in &self.strategy.profiles {
            if !known(&profile.preferred_provider) {
                return Err(FidocError::Config(format!(
                    "{:?} prefers unknown provider '{}'",
                    profile.category, profile.preferred_provider
                )));
            }
            if !(0.0..=1.0).contains(&profile.required_quality) {
                return Err(FidocError::Config(format!(
                    "{:?} required quality {} outside [0, 1]",
                    profile.category, profile.required_quality
                )));
            }
        }

        let c = &self.classifier;
        for (name, value) in [
            ("min_confidence", c.min_confidence),
            ("fallback_confidence", c.fallback_confidence),
            ("nfce_split", c.nfce_split),
            ("low_water_mark", self.orchestrator.low_water_mark),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FidocError::Config(format!("{} {} outside [0, 1]", name, value)));
            }
        }

        ProviderCatalog::new(self.providers.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FidocConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.providers.len(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "classifier": { "min_confidence": 0.35 }, "budget": { "daily_budget_limit": "10" } }"#;
        let config: FidocConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.classifier.min_confidence, 0.35);
        assert_eq!(config.classifier.nfce_split, 0.4);
        assert_eq!(config.budget.daily_budget_limit.to_string(), "10");
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.orchestrator.max_retries, 1);
    }

    #[test]
    fn test_unknown_fallback_provider_rejected() {
        let mut config = FidocConfig::default();
        config.strategy.fallback_chain.push("azure".to_string());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("azure"));
    }

    #[test]
    fn test_profile_falls_back_to_general() {
        let mut strategy = StrategyConfig::default();
        strategy.profiles.retain(|p| p.category != DocumentCategory::Receipt);

        let profile = strategy.profile(DocumentCategory::Receipt).unwrap();
        assert_eq!(profile.category, DocumentCategory::General);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fidoc.json");

        let mut config = FidocConfig::default();
        config.orchestrator.provider_timeout_ms = 5_000;
        config.save(&path).unwrap();

        let loaded = FidocConfig::from_file(&path).unwrap();
        assert_eq!(loaded.orchestrator.provider_timeout_ms, 5_000);
    }
}
