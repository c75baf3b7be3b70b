//! Spending ceilings, the budget store seam and the reservation ledger.
//!
//! [`check_budget`] is the pure gate. [`BudgetLedger`] makes check-then-spend
//! atomic across concurrent documents by counting reservations that have been
//! granted but not yet settled.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::FidocError;

/// Spending ceilings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetLimits {
    /// Largest estimated cost accepted for a single document.
    pub max_cost_per_document: Decimal,
    /// Ceiling for the current day.
    pub daily_budget_limit: Decimal,
    /// Ceiling for the current month.
    pub monthly_budget_limit: Decimal,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            max_cost_per_document: Decimal::ONE,
            daily_budget_limit: Decimal::from(50),
            monthly_budget_limit: Decimal::from(1_000),
        }
    }
}

/// Running spend counters for the current periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub daily_spent: Decimal,
    pub monthly_spent: Decimal,
}

/// Which ceiling a cost would break.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetViolation {
    #[error("document cost {cost} exceeds per-document limit {limit}")]
    PerDocument { cost: Decimal, limit: Decimal },

    #[error("daily spend {spent} + {cost} exceeds limit {limit}")]
    Daily {
        spent: Decimal,
        cost: Decimal,
        limit: Decimal,
    },

    #[error("monthly spend {spent} + {cost} exceeds limit {limit}")]
    Monthly {
        spent: Decimal,
        cost: Decimal,
        limit: Decimal,
    },
}

/// Reject `cost` if it would break any ceiling. Reaching a ceiling exactly is allowed.
pub fn check_budget(
    limits: &BudgetLimits,
    state: &BudgetState,
    cost: Decimal,
) -> Result<(), BudgetViolation> {
    if cost > limits.max_cost_per_document {
        return Err(BudgetViolation::PerDocument {
            cost,
            limit: limits.max_cost_per_document,
        });
    }
    if state.daily_spent + cost > limits.daily_budget_limit {
        return Err(BudgetViolation::Daily {
            spent: state.daily_spent,
            cost,
            limit: limits.daily_budget_limit,
        });
    }
    if state.monthly_spent + cost > limits.monthly_budget_limit {
        return Err(BudgetViolation::Monthly {
            spent: state.monthly_spent,
            cost,
            limit: limits.monthly_budget_limit,
        });
    }
    Ok(())
}

/// Persistent spend counters, shared by every pipeline instance.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Current counters.
    async fn get_budget(&self) -> Result<BudgetState, FidocError>;

    /// Add `amount` to both counters.
    async fn commit_spend(&self, amount: Decimal) -> Result<(), FidocError>;
}

/// Process-local [`BudgetStore`]. Period rollover is driven by the caller.
#[derive(Debug, Default)]
pub struct InMemoryBudgetStore {
    state: Mutex<BudgetState>,
}

impl InMemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing counters.
    pub fn with_state(state: BudgetState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Zero the daily counter.
    pub async fn reset_daily(&self) {
        self.state.lock().await.daily_spent = Decimal::ZERO;
    }

    /// Zero both counters.
    pub async fn reset_monthly(&self) {
        let mut state = self.state.lock().await;
        state.daily_spent = Decimal::ZERO;
        state.monthly_spent = Decimal::ZERO;
    }
}

#[async_trait]
impl BudgetStore for InMemoryBudgetStore {
    async fn get_budget(&self) -> Result<BudgetState, FidocError> {
        Ok(self.state.lock().await.clone())
    }

    async fn commit_spend(&self, amount: Decimal) -> Result<(), FidocError> {
        let mut state = self.state.lock().await;
        state.daily_spent += amount;
        state.monthly_spent += amount;
        Ok(())
    }
}

/// Budget granted to one provider call. Consumed by settle or release.
#[derive(Debug, PartialEq)]
#[must_use = "a reservation must be settled or released"]
pub struct Reservation {
    amount: Decimal,
}

impl Reservation {
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Serialises budget checks so concurrent documents cannot jointly overspend.
pub struct BudgetLedger {
    store: Arc<dyn BudgetStore>,
    limits: BudgetLimits,
    outstanding: Mutex<Decimal>,
}

impl BudgetLedger {
    pub fn new(store: Arc<dyn BudgetStore>, limits: BudgetLimits) -> Self {
        Self {
            store,
            limits,
            outstanding: Mutex::new(Decimal::ZERO),
        }
    }

    /// Check `cost` against committed plus outstanding spend and reserve it.
    pub async fn reserve(&self, cost: Decimal) -> Result<Reservation, FidocError> {
        let mut outstanding = self.outstanding.lock().await;
        let committed = self.store.get_budget().await?;
        let projected = BudgetState {
            daily_spent: committed.daily_spent + *outstanding,
            monthly_spent: committed.monthly_spent + *outstanding,
        };

        check_budget(&self.limits, &projected, cost).map_err(FidocError::BudgetExceeded)?;

        *outstanding += cost;
        debug!("Reserved {} (outstanding {})", cost, *outstanding);
        Ok(Reservation { amount: cost })
    }

    /// Commit the real cost of a completed call and drop its reservation.
    ///
    /// If the store rejects the commit, the actual cost stays counted as
    /// outstanding so later reservations still see it.
    pub async fn settle(
        &self,
        reservation: Reservation,
        actual_cost: Decimal,
    ) -> Result<(), FidocError> {
        let mut outstanding = self.outstanding.lock().await;
        if let Err(e) = self.store.commit_spend(actual_cost).await {
            *outstanding += actual_cost - reservation.amount;
            warn!(
                "Failed to commit {} to the budget store, holding it as outstanding: {}",
                actual_cost, e
            );
            return Err(e);
        }
        *outstanding -= reservation.amount;
        debug!(
            "Settled {} against reservation of {}",
            actual_cost, reservation.amount
        );
        Ok(())
    }

    /// Drop a reservation without spending.
    pub async fn release(&self, reservation: Reservation) {
        let mut outstanding = self.outstanding.lock().await;
        *outstanding -= reservation.amount;
    }

    /// Sum of reservations not yet settled or released.
    pub async fn outstanding(&self) -> Decimal {
        *self.outstanding.lock().await
    }

    pub fn limits(&self) -> &BudgetLimits {
        &self.limits
    }
}

impl std::fmt::Debug for BudgetLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetLedger")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
