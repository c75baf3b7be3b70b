//! Core library for fiscal document intake.
//!
//! This crate provides:
//! - Heuristic document type classification (NFe, NFCe, pró-labore, recibo, boleto, contrato, extrato)
//! - Provider catalog and cost/quality-bounded processing strategy selection
//! - Budget gate with atomic reservations and per-provider rate tracking
//! - Field validation (CNPJ, CPF, dates, amounts, NFe access keys) with confidence adjustment
//! - An orchestrator that walks the provider fallback chain and aggregates confidence

pub mod classifier;
pub mod error;
pub mod extract;
pub mod intake;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod validation;

pub use classifier::Classifier;
pub use error::{FidocError, Result};
pub use models::config::FidocConfig;
pub use models::document::{DocumentClassification, DocumentType, RawDocument};
pub use models::extraction::{AggregatedExtraction, Verdict};
pub use intake::{inspect, DocumentProfile};
pub use pipeline::{CancelHandle, CancelSignal, ConfidenceAggregator, Orchestrator};
pub use provider::budget::{
    BudgetLedger, BudgetLimits, BudgetState, BudgetStore, BudgetViolation, InMemoryBudgetStore,
};
pub use provider::catalog::{ProviderCatalog, ProviderConfig, RateLimit};
pub use provider::strategy::{DocumentCategory, ProcessingStrategy, StrategySelector};
pub use validation::{FieldValidator, ValidationResult};

/// Re-export provider contract types.
pub use fidoc_provider::{
    ExtractOptions, ExtractedFields, ExtractionProvider, FileRef, ProviderError, ProviderOutput,
};
