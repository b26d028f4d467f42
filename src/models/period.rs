//! Budget period representation
//!
//! A [`BudgetPeriod`] is a one-calendar-month snapshot of a budget's amount,
//! with its base-currency conversion frozen when the period was created or
//! last synced. [`Month`] is the calendar key (`"2025-11"`) periods and
//! spending rows are grouped by.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, BudgetPeriodId};
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

/// A calendar month (e.g., "2025-01")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month, rejecting month numbers outside 1..=12
    pub fn new(year: i32, month: u32) -> LedgerResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::Validation(format!("invalid month: {}", month)));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(LedgerError::Validation(format!("invalid year: {}", year)));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given instant (UTC)
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> LedgerResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| LedgerError::Validation(format!("invalid month: {}", self)))
    }

    /// Last day of the month
    pub fn last_day(&self) -> LedgerResult<NaiveDate> {
        Ok(self.next().first_day()? - Duration::days(1))
    }

    /// First instant of the month (00:00:00 UTC on the 1st)
    pub fn start(&self) -> LedgerResult<DateTime<Utc>> {
        let midnight = self
            .first_day()?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| LedgerError::Validation(format!("invalid month: {}", self)))?;
        Ok(Utc.from_utc_datetime(&midnight))
    }

    /// Last instant of the month (23:59:59.999999999 UTC on the last day)
    pub fn end(&self) -> LedgerResult<DateTime<Utc>> {
        let last = self
            .last_day()?
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| LedgerError::Validation(format!("invalid month: {}", self)))?;
        Ok(Utc.from_utc_datetime(&last))
    }

    /// Check if an instant falls within this month
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        Self::containing(at) == *self
    }

    /// Get the next month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Get the previous month
    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Parse a month string of the form "YYYY-MM"
    pub fn parse(s: &str) -> LedgerResult<Self> {
        let s = s.trim();
        let invalid = || LedgerError::Validation(format!("invalid month format: {}", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One calendar-month snapshot of a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPeriod {
    /// Unique identifier
    pub id: BudgetPeriodId,

    /// Owning budget
    pub budget_id: BudgetId,

    /// First instant of the month
    pub start_date: DateTime<Utc>,

    /// Last instant of the month (inclusive)
    pub end_date: DateTime<Utc>,

    /// The budget's face value, in the budget's own currency
    pub amount: Money,

    /// `amount` converted into the base currency
    pub base_amount: Money,

    /// Rate used to produce `base_amount`
    pub exchange_rate: Decimal,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl BudgetPeriod {
    /// Calendar month this period covers
    pub fn month(&self) -> Month {
        Month::containing(self.start_date)
    }

    /// Check if an instant falls within this period
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at <= self.end_date
    }

    /// Validate the period's invariants
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid budget period id: {:?}",
                self.id.as_str()
            )));
        }
        if !self.budget_id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid budget id: {:?}",
                self.budget_id.as_str()
            )));
        }
        if self.end_date < self.start_date {
            return Err(LedgerError::Validation(
                "period end date must not precede its start date".into(),
            ));
        }
        if self.amount.is_negative() {
            return Err(LedgerError::Validation(
                "period amount cannot be negative".into(),
            ));
        }
        if self.amount.currency().is_empty() || self.base_amount.currency().is_empty() {
            return Err(LedgerError::Validation(
                "period amounts must carry a currency".into(),
            ));
        }
        self.amount.validate()?;
        self.base_amount.validate()?;
        if self.exchange_rate <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "period exchange rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} ({})",
            self.budget_id,
            self.month(),
            self.amount,
            self.base_amount
        )
    }
}
