//! Query types accepted by the stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BudgetId, BudgetPeriod, BudgetPeriodId, Transaction};

/// Narrows a transaction listing; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub budget_id: Option<BudgetId>,
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Inclusive lower bound on the transaction date
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the transaction date
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn for_budget(budget_id: BudgetId) -> Self {
        Self {
            budget_id: Some(budget_id),
            ..Self::default()
        }
    }

    pub fn for_period(budget_period_id: BudgetPeriodId) -> Self {
        Self {
            budget_period_id: Some(budget_period_id),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, trx: &Transaction) -> bool {
        if let Some(id) = &self.budget_id {
            if trx.budget_id.as_ref() != Some(id) {
                return false;
            }
        }
        if let Some(id) = &self.budget_period_id {
            if trx.budget_period_id.as_ref() != Some(id) {
                return false;
            }
        }
        self.from.map_or(true, |from| trx.date >= from) && self.to.map_or(true, |to| trx.date <= to)
    }
}

/// Existence check used to guard deletes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionCriteria {
    pub budget_id: Option<BudgetId>,
    pub budget_period_id: Option<BudgetPeriodId>,
}

impl TransactionCriteria {
    pub fn budget(budget_id: BudgetId) -> Self {
        Self {
            budget_id: Some(budget_id),
            budget_period_id: None,
        }
    }

    pub fn period(budget_period_id: BudgetPeriodId) -> Self {
        Self {
            budget_id: None,
            budget_period_id: Some(budget_period_id),
        }
    }

    /// Criteria with no constraint match nothing
    pub fn matches(&self, trx: &Transaction) -> bool {
        if self.budget_id.is_none() && self.budget_period_id.is_none() {
            return false;
        }
        self.budget_id
            .as_ref()
            .map_or(true, |id| trx.budget_id.as_ref() == Some(id))
            && self
                .budget_period_id
                .as_ref()
                .map_or(true, |id| trx.budget_period_id.as_ref() == Some(id))
    }
}

/// Window and budget subset for spending insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsFilter {
    /// Inclusive start of the window
    pub from: DateTime<Utc>,
    /// Inclusive end of the window
    pub to: DateTime<Utc>,
    /// Restrict to these budgets; empty means all budgets
    #[serde(default)]
    pub budget_ids: Vec<BudgetId>,
}

impl InsightsFilter {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            budget_ids: Vec::new(),
        }
    }

    pub fn with_budgets(mut self, budget_ids: impl IntoIterator<Item = BudgetId>) -> Self {
        self.budget_ids = budget_ids.into_iter().collect();
        self
    }

    pub fn includes_budget(&self, budget_id: &BudgetId) -> bool {
        self.budget_ids.is_empty() || self.budget_ids.contains(budget_id)
    }

    /// Whether any part of the period falls inside the window
    pub fn overlaps(&self, period: &BudgetPeriod) -> bool {
        period.start_date <= self.to && period.end_date >= self.from
    }
}
