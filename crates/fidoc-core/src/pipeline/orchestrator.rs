//! Drives one document through intake, provider calls and validation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use fidoc_provider::{ExtractOptions, ExtractionProvider, FileRef, ProviderError, ProviderOutput};

use super::{CancelSignal, ConfidenceAggregator};
use crate::classifier::Classifier;
use crate::error::{FidocError, Result};
use crate::extract;
use crate::intake::{self, DocumentProfile};
use crate::models::config::FidocConfig;
use crate::models::document::RawDocument;
use crate::models::extraction::AggregatedExtraction;
use crate::provider::budget::{BudgetLedger, BudgetStore, BudgetViolation};
use crate::provider::catalog::{ProviderCatalog, ProviderConfig};
use crate::provider::rate::RateTracker;
use crate::provider::strategy::{ProcessingStrategy, StrategySelector};
use crate::validation::FieldValidator;

/// Language hint passed to every provider.
const DOCUMENT_LANGUAGE: &str = "pt";

/// The document pipeline.
///
/// Holds only immutable configuration plus the budget ledger and rate
/// tracker, both internally synchronised, so one instance can process many
/// documents concurrently.
pub struct Orchestrator {
    config: FidocConfig,
    catalog: Arc<ProviderCatalog>,
    classifier: Classifier,
    selector: StrategySelector,
    validator: FieldValidator,
    aggregator: ConfidenceAggregator,
    ledger: BudgetLedger,
    rates: RateTracker,
    providers: HashMap<String, Arc<dyn ExtractionProvider>>,
}

struct Completed {
    provider: String,
    output: ProviderOutput,
    cost: Decimal,
    warnings: Vec<String>,
}

impl Orchestrator {
    /// Build a pipeline from validated configuration and a budget store.
    pub fn new(config: FidocConfig, store: Arc<dyn BudgetStore>) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(ProviderCatalog::new(config.providers.clone())?);
        let selector = StrategySelector::new(catalog.clone(), config.strategy.clone());

        Ok(Self {
            classifier: Classifier::new(config.classifier.clone()),
            validator: FieldValidator::new(config.validation.clone()),
            aggregator: ConfidenceAggregator::new(config.orchestrator.low_water_mark),
            ledger: BudgetLedger::new(store, config.budget.clone()),
            rates: RateTracker::new(),
            providers: HashMap::new(),
            catalog,
            selector,
            config,
        })
    }

    /// Register a provider implementation under its catalog name.
    pub fn register(mut self, provider: Arc<dyn ExtractionProvider>) -> Self {
        if self.catalog.get(provider.name()).is_none() {
            warn!("Registering provider '{}' that is not in the catalog", provider.name());
        }
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Pin "today" for date validation.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.validator = self.validator.with_reference_date(date);
        self
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Process one document.
    pub async fn process(
        &self,
        doc: RawDocument,
        cancel: &CancelSignal,
    ) -> Result<AggregatedExtraction> {
        let profile = intake::inspect(&doc, &self.catalog, self.config.orchestrator.max_sample_chars)
            .await?;
        let sample = profile.content_sample.as_deref().unwrap_or("");

        let mut classification = self.classifier.classify(sample, &doc.file_name);
        let strategy = self.selector.select_with_pages(
            &doc.file_name,
            profile.file_size,
            profile.content_sample.as_deref(),
            profile.pages,
        );

        let primary = self
            .catalog
            .get(&strategy.provider)
            .filter(|p| profile.accepted_by(p))
            .ok_or_else(|| {
                FidocError::UnsupportedDocument(format!(
                    "no provider accepts a {} byte .{} file",
                    profile.file_size, profile.extension
                ))
            })?;

        let options = ExtractOptions {
            file_name: doc.file_name.clone(),
            document_type: Some(classification.document_type.as_str().to_string()),
            pages: profile.pages,
            timeout_ms: self.config.orchestrator.provider_timeout_ms,
            language: Some(DOCUMENT_LANGUAGE.to_string()),
        };

        let mut attempted = Vec::new();
        let completed = self
            .run_chain(primary, &strategy, &profile, &doc.source, &options, cancel, &mut attempted)
            .await?;

        let Completed {
            provider,
            output,
            cost,
            mut warnings,
        } = completed;
        let mut fields = output.fields;

        if self.config.orchestrator.backfill_from_text {
            warnings.extend(extract::backfill(&mut fields, &output.raw_text));
        }

        if classification.is_fallback() && !output.raw_text.trim().is_empty() {
            let second = self.classifier.classify(&output.raw_text, &doc.file_name);
            if !second.is_fallback() {
                debug!(
                    "Reclassified {} from provider text as {}",
                    doc.file_name, second.document_type
                );
                classification = second;
            }
        }

        let validation = self.validator.validate(&fields, classification.document_type);
        let (final_confidence, verdict) = self.aggregator.aggregate(
            output.provider_confidence,
            &validation,
            strategy.quality_requirement,
        );

        let mut validation_warnings = validation.warnings;
        validation_warnings.extend(warnings);
        if !strategy.quality_guaranteed {
            validation_warnings.push(format!(
                "quality not guaranteed: no provider met the required quality {:.2}",
                strategy.quality_requirement
            ));
        }

        info!(
            "Processed {} as {} via '{}': confidence {:.2}, {:?}, cost {}",
            doc.file_name, classification.document_type, provider, final_confidence, verdict, cost
        );

        Ok(AggregatedExtraction {
            fields,
            raw_text: output.raw_text,
            classification,
            category: strategy.category,
            provider_confidence: output.provider_confidence,
            final_confidence,
            verdict,
            validation_errors: validation.errors,
            validation_warnings,
            provider,
            attempted_providers: attempted,
            cost,
        })
    }

    /// Walk the primary provider and its fallbacks until one succeeds.
    #[allow(clippy::too_many_arguments)]
    async fn run_chain(
        &self,
        primary: &ProviderConfig,
        strategy: &ProcessingStrategy,
        profile: &DocumentProfile,
        file: &FileRef,
        options: &ExtractOptions,
        cancel: &CancelSignal,
        attempted: &mut Vec<String>,
    ) -> Result<Completed> {
        let mut queue: VecDeque<&ProviderConfig> = VecDeque::from([primary]);
        queue.extend(
            strategy
                .fallback_providers
                .iter()
                .filter_map(|name| self.catalog.get(name))
                .filter(|p| profile.accepted_by(p)),
        );

        let pages = Decimal::from(strategy.pages);
        let mut is_primary = true;
        let mut budget_blocked: Option<BudgetViolation> = None;
        let mut other_skips = 0usize;

        while let Some(config) = queue.pop_front() {
            let first = std::mem::replace(&mut is_primary, false);

            if cancel.is_cancelled() {
                info!("Cancelled {} before calling '{}'", options.file_name, config.name);
                return Err(FidocError::Cancelled);
            }

            let Some(provider) = self.providers.get(&config.name) else {
                warn!("Provider '{}' is not registered, skipping", config.name);
                other_skips += 1;
                continue;
            };

            let cost = config.cost_per_request * pages;
            let reservation = match self.ledger.reserve(cost).await {
                Ok(reservation) => reservation,
                Err(FidocError::BudgetExceeded(violation)) => {
                    if first {
                        let redirect = self.budget_redirect(config, strategy, profile);
                        let Some(target) = redirect.first() else {
                            warn!("Budget exceeded for {}: {}", options.file_name, violation);
                            return Err(FidocError::BudgetExceeded(violation));
                        };
                        warn!(
                            "Budget exceeded for '{}' ({}), redirecting to '{}'",
                            config.name, violation, target.name
                        );
                        let rest: Vec<_> = queue
                            .drain(..)
                            .filter(|p| !redirect.iter().any(|r| r.name == p.name))
                            .collect();
                        queue.extend(redirect);
                        queue.extend(rest);
                    } else {
                        debug!("Skipping '{}': {}", config.name, violation);
                    }
                    budget_blocked.get_or_insert(violation);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !self.rates.try_acquire(&config.name, &config.rate_limit) {
                warn!("Provider '{}' is rate limited, skipping", config.name);
                self.ledger.release(reservation).await;
                other_skips += 1;
                continue;
            }

            attempted.push(config.name.clone());
            match self.call(config, provider.as_ref(), file, options, cancel).await {
                Ok(output) => {
                    let charged = output.actual_cost.unwrap_or(cost);
                    let mut warnings = Vec::new();
                    // the call is paid for either way, so keep its output
                    if let Err(e) = self.ledger.settle(reservation, charged).await {
                        warnings.push(format!("spend of {} not recorded: {}", charged, e));
                    }
                    return Ok(Completed {
                        provider: config.name.clone(),
                        output,
                        cost: charged,
                        warnings,
                    });
                }
                Err(e) => {
                    warn!("Provider '{}' failed for {}: {}", config.name, options.file_name, e);
                    self.ledger.release(reservation).await;
                }
            }
        }

        match budget_blocked {
            Some(violation) if attempted.is_empty() && other_skips == 0 => {
                Err(FidocError::BudgetExceeded(violation))
            }
            _ => Err(FidocError::ProviderUnavailable {
                attempted: attempted.clone(),
            }),
        }
    }

    /// Cheaper fallbacks that still meet the strategy's quality and size constraints.
    fn budget_redirect<'a>(
        &'a self,
        over_budget: &ProviderConfig,
        strategy: &ProcessingStrategy,
        profile: &DocumentProfile,
    ) -> Vec<&'a ProviderConfig> {
        let required = if strategy.quality_guaranteed {
            strategy.quality_requirement
        } else {
            0.0
        };

        strategy
            .fallback_providers
            .iter()
            .filter_map(|name| self.catalog.get(name))
            .filter(|p| {
                p.enabled
                    && p.cost_per_request < over_budget.cost_per_request
                    && p.meets_quality(required)
                    && profile.accepted_by(p)
            })
            .collect()
    }

    /// One provider call with a deadline and at most one retry.
    ///
    /// The retry needs its own rate permit and is skipped without one.
    async fn call(
        &self,
        config: &ProviderConfig,
        provider: &dyn ExtractionProvider,
        file: &FileRef,
        options: &ExtractOptions,
        cancel: &CancelSignal,
    ) -> std::result::Result<ProviderOutput, ProviderError> {
        let timeout_ms = self.config.orchestrator.provider_timeout_ms;
        let retries = self.config.orchestrator.max_retries.min(1);
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(
                Duration::from_millis(timeout_ms),
                provider.extract(file, options),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout_ms)),
            };

            match result {
                Ok(output) => return Ok(output),
                Err(e) if attempt < retries && e.is_transient() && !cancel.is_cancelled() => {
                    if !self.rates.try_acquire(&config.name, &config.rate_limit) {
                        debug!("Not retrying rate limited '{}' after: {}", config.name, e);
                        return Err(e);
                    }
                    attempt += 1;
                    debug!("Retrying '{}' after: {}", config.name, e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
