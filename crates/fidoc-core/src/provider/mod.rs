//! Provider catalog, strategy selection, budget control and rate tracking.

pub mod budget;
pub mod catalog;
pub mod rate;
pub mod strategy;

pub use budget::{
    check_budget, BudgetLedger, BudgetLimits, BudgetState, BudgetStore, BudgetViolation,
    InMemoryBudgetStore, Reservation,
};
pub use catalog::{ProviderCatalog, ProviderConfig, RateLimit};
pub use rate::RateTracker;
pub use strategy::{DocumentCategory, ProcessingStrategy, StrategySelector};
