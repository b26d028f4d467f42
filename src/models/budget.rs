//! Budget model
//!
//! A budget is a named, currency-denominated amount planned per calendar
//! month. Each month it is instantiated as a [`BudgetPeriod`] snapshot whose
//! base-currency value is frozen until explicitly resynced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::currency::Currency;
use super::ids::{BudgetId, BudgetPeriodId, IdGenerator};
use super::money::{CurrencyCode, Money};
use super::period::{BudgetPeriod, Month};
use crate::error::{LedgerError, LedgerResult};
use crate::fieldmask::{Field, FieldMask, Schema};

/// Maximum budget name length, in characters
pub const MAX_BUDGET_NAME_LEN: usize = 32;

/// Fields a budget update may touch
pub const BUDGET_UPDATE_SCHEMA: Schema = Schema::new(
    "budget",
    &[
        Field::required("name", "Display name, 1-32 characters"),
        Field::required("amount", "Amount per period; the currency is fixed at creation"),
    ],
);

/// A recurring budgeted amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// Budget name (e.g., "Groceries")
    pub name: String,

    /// Amount budgeted per period
    pub amount: Money,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last modified
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new budget with a fresh ID and a trimmed name
    pub fn create(ids: &dyn IdGenerator, name: impl Into<String>, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::generate(ids),
            name: name.into().trim().to_string(),
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Currency the budget is denominated in
    pub fn currency(&self) -> &CurrencyCode {
        self.amount.currency()
    }

    /// Validate the budget
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid budget id: {:?}",
                self.id.as_str()
            )));
        }

        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_BUDGET_NAME_LEN {
            return Err(LedgerError::Validation(format!(
                "budget name must be 1-{} characters",
                MAX_BUDGET_NAME_LEN
            )));
        }

        if !self.amount.is_positive() {
            return Err(LedgerError::Validation(
                "budget amount must be positive".into(),
            ));
        }

        self.amount.validate()?;
        Ok(())
    }

    /// Copy the masked fields of `other` into this budget
    ///
    /// The mask is checked against [`BUDGET_UPDATE_SCHEMA`]; an empty mask
    /// replaces every updatable field. The budget is left untouched when any
    /// check fails.
    pub fn update(&mut self, other: &Budget, mask: &FieldMask) -> LedgerResult<()> {
        BUDGET_UPDATE_SCHEMA.validate(mask)?;
        self.ensure_initialized()?;

        let mut updated = self.clone();

        if mask.contains("name") {
            updated.name = other.name.trim().to_string();
        }

        if mask.contains("amount") {
            if !other.amount.same_currency(&self.amount) {
                return Err(LedgerError::Validation(format!(
                    "budget currency cannot change from {} to {}",
                    self.amount.currency(),
                    other.amount.currency()
                )));
            }
            updated.amount = other.amount.clone();
        }

        updated.validate()?;
        updated.updated_at = Utc::now();
        *self = updated;
        Ok(())
    }

    /// Instantiate the period for the calendar month containing `at`
    ///
    /// The budget's amount is copied verbatim and converted into the base
    /// currency with the currency's current rate. Later changes to either do
    /// not affect the returned period until [`Budget::sync_period`] runs.
    pub fn create_period(
        &self,
        currency: &Currency,
        at: DateTime<Utc>,
        ids: &dyn IdGenerator,
    ) -> LedgerResult<BudgetPeriod> {
        self.ensure_initialized()?;
        self.ensure_currency(currency)?;

        let month = Month::containing(at);
        let now = Utc::now();
        let period = BudgetPeriod {
            id: BudgetPeriodId::generate(ids),
            budget_id: self.id.clone(),
            start_date: month.start()?,
            end_date: month.end()?,
            amount: self.amount.clone(),
            base_amount: self.base_amount(currency)?,
            exchange_rate: currency.rate,
            created_at: now,
            updated_at: now,
        };

        period.validate()?;
        Ok(period)
    }

    /// Recompute a period's base amount and rate from this budget and `currency`
    ///
    /// Only `base_amount`, `exchange_rate` and `updated_at` change; the
    /// period's face `amount` is left as it was.
    pub fn sync_period(&self, period: &mut BudgetPeriod, currency: &Currency) -> LedgerResult<()> {
        self.ensure_initialized()?;
        if period.id.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "budget period is not initialized".into(),
            ));
        }
        if period.budget_id != self.id {
            return Err(LedgerError::InvalidArgument(format!(
                "period {} belongs to budget {}, not {}",
                period.id, period.budget_id, self.id
            )));
        }
        self.ensure_currency(currency)?;

        period.base_amount = self.base_amount(currency)?;
        period.exchange_rate = currency.rate;
        period.updated_at = Utc::now();
        Ok(())
    }

    fn base_amount(&self, currency: &Currency) -> LedgerResult<Money> {
        self.amount
            .exchange(&CurrencyCode::base(), currency.rate)
            .map_err(|e| LedgerError::conversion("cannot convert budget amount to base currency", e))
    }

    fn ensure_initialized(&self) -> LedgerResult<()> {
        if self.id.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "budget is not initialized".into(),
            ));
        }
        Ok(())
    }

    fn ensure_currency(&self, currency: &Currency) -> LedgerResult<()> {
        if self.amount.currency() != &currency.code {
            return Err(LedgerError::InvalidArgument(format!(
                "budget {} is in {}, not {}",
                self.id,
                self.amount.currency(),
                currency.code
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.amount)
    }
}
