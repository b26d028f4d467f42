//! Spending insights
//!
//! Folds flat [`SpendingSeries`] rows into a three-tier rollup in one pass:
//! an overall summary, one summary per budget, and one trend entry per
//! period with its own per-budget breakdown. Rows may arrive in any order.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::BudgetId;
use super::money::{CurrencyCode, Money, MoneyError};
use crate::error::{LedgerError, LedgerResult};

/// Budgeted against spent for one budget in one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSeries {
    pub budget_id: BudgetId,
    pub budget_name: String,
    /// Period key, `YYYY-MM`
    pub period: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub budgeted: Money,
    pub spent: Money,
    pub count: u64,
}

impl SpendingSeries {
    /// Currency every amount in the row is expressed in
    pub fn currency(&self) -> &CurrencyCode {
        self.budgeted.currency()
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if !self.budgeted.same_currency(&self.spent) {
            return Err(LedgerError::Validation(format!(
                "spending row for {} in {} mixes {} and {}",
                self.budget_id,
                self.period,
                self.budgeted.currency(),
                self.spent.currency()
            )));
        }
        if self.budgeted.is_negative() || self.spent.is_negative() {
            return Err(LedgerError::Validation(format!(
                "spending row for {} in {} has negative amounts",
                self.budget_id, self.period
            )));
        }
        Ok(())
    }
}

/// Running totals shared by every tier of the rollup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingAggregate {
    pub budgeted: Money,
    pub spent: Money,
    pub count: u64,
}

impl SpendingAggregate {
    pub fn new(budgeted: Money, spent: Money, count: u64) -> Self {
        Self {
            budgeted,
            spent,
            count,
        }
    }

    /// Budgeted minus spent; negative when overspent
    pub fn remaining(&self) -> Money {
        Money::new(
            self.budgeted.cents().saturating_sub(self.spent.cents()),
            self.budgeted.currency().clone(),
        )
    }

    /// Spent as a percentage of budgeted, to 2 decimal places
    ///
    /// Zero when nothing was budgeted.
    pub fn usage(&self) -> f64 {
        if self.budgeted.cents() == 0 {
            return 0.0;
        }
        let spent = Decimal::from(self.spent.cents());
        let budgeted = Decimal::from(self.budgeted.cents());
        (spent * Decimal::ONE_HUNDRED / budgeted)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(0.0)
    }

    fn fold(&mut self, series: &SpendingSeries) -> Result<(), MoneyError> {
        let budgeted = accumulate(&self.budgeted, &series.budgeted)?;
        let spent = accumulate(&self.spent, &series.spent)?;
        let count = self
            .count
            .checked_add(series.count)
            .ok_or(MoneyError::Overflow)?;

        self.budgeted = budgeted;
        self.spent = spent;
        self.count = count;
        Ok(())
    }
}

/// Add `amount` to `total`, adopting its currency while `total` has none
fn accumulate(total: &Money, amount: &Money) -> Result<Money, MoneyError> {
    if total.currency().is_empty() {
        let cents = total
            .cents()
            .checked_add(amount.cents())
            .ok_or(MoneyError::Overflow)?;
        return Ok(Money::new(cents, amount.currency().clone()));
    }
    total.checked_add(amount)
}

/// Totals for one budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingBudgetSummary {
    pub budget_id: BudgetId,
    pub budget_name: String,
    #[serde(flatten)]
    pub totals: SpendingAggregate,
}

impl SpendingBudgetSummary {
    fn for_series(series: &SpendingSeries) -> Self {
        Self {
            budget_id: series.budget_id.clone(),
            budget_name: series.budget_name.clone(),
            totals: SpendingAggregate::default(),
        }
    }

    /// Fold a row in; rows for other budgets are ignored
    pub fn aggregate(&mut self, series: &SpendingSeries) -> LedgerResult<()> {
        if series.budget_id != self.budget_id {
            return Ok(());
        }
        self.totals.fold(series)?;
        Ok(())
    }
}

/// Totals for one period, with a per-budget breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingTrendPeriod {
    pub period: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(flatten)]
    pub totals: SpendingAggregate,
    pub budgets: Vec<SpendingBudgetSummary>,
    #[serde(skip)]
    budget_index: HashMap<BudgetId, usize>,
}

impl SpendingTrendPeriod {
    fn for_series(series: &SpendingSeries) -> Self {
        Self {
            period: series.period.clone(),
            period_start: series.period_start,
            period_end: series.period_end,
            ..Self::default()
        }
    }

    /// Fold a row in; rows for other periods are ignored
    pub fn aggregate(&mut self, series: &SpendingSeries) -> LedgerResult<()> {
        if series.period != self.period {
            return Ok(());
        }
        self.totals.fold(series)?;

        let slot = slot_for(
            &mut self.budget_index,
            &mut self.budgets,
            &series.budget_id,
            |summary| summary.budget_id.clone(),
            || SpendingBudgetSummary::for_series(series),
        );
        self.budgets[slot].aggregate(series)
    }
}

/// The three-tier spending rollup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingInsights {
    pub summary: SpendingAggregate,
    pub by_budget: Vec<SpendingBudgetSummary>,
    pub trends: Vec<SpendingTrendPeriod>,
    #[serde(skip)]
    budget_index: HashMap<BudgetId, usize>,
    #[serde(skip)]
    period_index: HashMap<String, usize>,
}

impl SpendingInsights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rollup from a batch of rows
    pub fn from_series<'a, I>(rows: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = &'a SpendingSeries>,
    {
        let mut insights = Self::new();
        insights.process(rows)?;
        Ok(insights)
    }

    /// Fold every row in order, stopping at the first rejected row
    pub fn process<'a, I>(&mut self, rows: I) -> LedgerResult<()>
    where
        I: IntoIterator<Item = &'a SpendingSeries>,
    {
        for series in rows {
            self.aggregate(series)?;
        }
        Ok(())
    }

    /// Fold one row into all three tiers
    ///
    /// All rows must share one currency. A row in another currency is
    /// rejected before any total changes.
    pub fn aggregate(&mut self, series: &SpendingSeries) -> LedgerResult<()> {
        series.validate()?;
        let currency = self.summary.budgeted.currency();
        if !currency.is_empty() && currency != series.currency() {
            return Err(LedgerError::Validation(format!(
                "cannot aggregate {} spending into {} insights",
                series.currency(),
                currency
            )));
        }

        self.summary.fold(series)?;

        let slot = slot_for(
            &mut self.budget_index,
            &mut self.by_budget,
            &series.budget_id,
            |summary| summary.budget_id.clone(),
            || SpendingBudgetSummary::for_series(series),
        );
        self.by_budget[slot].aggregate(series)?;

        let slot = slot_for(
            &mut self.period_index,
            &mut self.trends,
            &series.period,
            |trend| trend.period.clone(),
            || SpendingTrendPeriod::for_series(series),
        );
        self.trends[slot].aggregate(series)
    }

    pub fn budget(&self, id: &BudgetId) -> Option<&SpendingBudgetSummary> {
        self.by_budget.iter().find(|summary| &summary.budget_id == id)
    }

    pub fn trend(&self, period: &str) -> Option<&SpendingTrendPeriod> {
        self.trends.iter().find(|trend| trend.period == period)
    }
}

/// Find or append the slot for `key`, keeping `index` in step with `slots`
///
/// The slot vectors are public, so the index is only trusted while the slot
/// it points at still carries `key`. A stale hit, or an index that has
/// fallen out of step with the slots (a deserialized rollup arrives without
/// one), triggers a rebuild from the slots themselves.
fn slot_for<K, T>(
    index: &mut HashMap<K, usize>,
    slots: &mut Vec<T>,
    key: &K,
    key_of: impl Fn(&T) -> K,
    create: impl FnOnce() -> T,
) -> usize
where
    K: std::hash::Hash + Eq + Clone,
{
    let cached = index.get(key).copied();
    let stale = match cached {
        Some(slot) => !slots.get(slot).is_some_and(|s| key_of(s) == *key),
        None => index.len() != slots.len(),
    };
    if !stale {
        if let Some(slot) = cached {
            return slot;
        }
    } else {
        *index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (key_of(slot), i))
            .collect();
        if let Some(&slot) = index.get(key) {
            return slot;
        }
    }
    slots.push(create());
    let slot = slots.len() - 1;
    index.insert(key.clone(), slot);
    slot
}
