//! Operation value object
//!
//! The shared core of every money movement request: what it is called, how
//! much it is for, and when it happened. Each field has its own validator so
//! partial updates can check only what they touch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

pub const MIN_TITLE_LEN: usize = 3;
pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 250;

/// Title, amount and dates of a money movement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Amount in the operation's own currency; an empty currency adopts the
    /// currency of the period the operation is posted to
    pub amount: Money,

    /// Custom rate overriding the tenant's rate for this operation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,

    /// When the operation happened
    pub date: Option<DateTime<Utc>>,

    /// When the operation takes effect for budgeting, if not `date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<DateTime<Utc>>,
}

impl Operation {
    pub fn new(title: impl Into<String>, amount: Money, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            amount,
            date: Some(date),
            ..Self::default()
        }
    }

    /// Trim surrounding whitespace from free-text fields
    pub fn sanitize(&mut self) {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
    }

    /// The date the operation counts towards: `effective_date`, else `date`
    pub fn effective_at(&self) -> Option<DateTime<Utc>> {
        self.effective_date.or(self.date)
    }

    /// Validate every field
    pub fn validate(&self) -> LedgerResult<()> {
        self.validate_title()?;
        self.validate_description()?;
        self.validate_amount()?;
        self.validate_exchange_rate()?;
        self.validate_date()
    }

    pub fn validate_title(&self) -> LedgerResult<()> {
        let len = self.title.trim().chars().count();
        if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&len) {
            return Err(LedgerError::Validation(format!(
                "title must be {}-{} characters",
                MIN_TITLE_LEN, MAX_TITLE_LEN
            )));
        }
        Ok(())
    }

    pub fn validate_description(&self) -> LedgerResult<()> {
        if self.description.trim().chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::Validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        Ok(())
    }

    pub fn validate_amount(&self) -> LedgerResult<()> {
        if !self.amount.is_positive() {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if !self.amount.currency().is_empty() {
            self.amount.validate()?;
        }
        Ok(())
    }

    pub fn validate_exchange_rate(&self) -> LedgerResult<()> {
        match self.exchange_rate {
            Some(rate) if rate <= Decimal::ZERO => Err(LedgerError::Validation(format!(
                "exchange rate must be positive, got {}",
                rate
            ))),
            _ => Ok(()),
        }
    }

    pub fn validate_date(&self) -> LedgerResult<()> {
        if self.date.is_none() {
            return Err(LedgerError::Validation("date is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::CurrencyCode;
    use chrono::TimeZone;

    fn coffee() -> Operation {
        Operation::new(
            "Coffee beans",
            Money::new(1250, CurrencyCode::new("USD")),
            Utc.with_ymd_and_hms(2025, 11, 3, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_valid_operation() {
        assert!(coffee().validate().is_ok());
    }

    #[test]
    fn test_sanitize() {
        let mut op = coffee();
        op.title = "  Coffee beans  ".into();
        op.description = "\tweekly\n".into();
        op.sanitize();
        assert_eq!(op.title, "Coffee beans");
        assert_eq!(op.description, "weekly");
    }

    #[test]
    fn test_title_bounds() {
        let mut op = coffee();
        op.title = "ab".into();
        assert!(op.validate_title().is_err());
        op.title = "abc".into();
        assert!(op.validate_title().is_ok());
        op.title = "x".repeat(51);
        assert!(op.validate_title().is_err());
    }

    #[test]
    fn test_description_bound() {
        let mut op = coffee();
        op.description = "x".repeat(250);
        assert!(op.validate_description().is_ok());
        op.description = "x".repeat(251);
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut op = coffee();
        op.amount = Money::new(0, CurrencyCode::new("USD"));
        assert!(op.validate().is_err());
        op.amount = Money::new(-5, CurrencyCode::new("USD"));
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_amount_without_currency_is_allowed() {
        let mut op = coffee();
        op.amount = Money::new(100, CurrencyCode::default());
        assert!(op.validate_amount().is_ok());
        op.amount = Money::new(100, CurrencyCode::new("dollars"));
        assert!(op.validate_amount().is_err());
    }

    #[test]
    fn test_custom_rate_must_be_positive() {
        let mut op = coffee();
        op.exchange_rate = Some(Decimal::ZERO);
        assert!(op.validate().is_err());
        op.exchange_rate = Some(Decimal::new(95, 2));
        assert!(op.validate().is_ok());
    }

    #[test]
    fn test_dates() {
        let mut op = coffee();
        op.date = None;
        assert!(op.validate().is_err());
        assert!(op.validate_date().is_err());

        // The epoch is an ordinary instant
        op.date = Some(DateTime::<Utc>::UNIX_EPOCH);
        op.effective_date = Some(DateTime::<Utc>::UNIX_EPOCH);
        assert!(op.validate().is_ok());
    }

    #[test]
    fn test_effective_at_prefers_effective_date() {
        let mut op = coffee();
        assert_eq!(op.effective_at(), op.date);

        let later = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        op.effective_date = Some(later);
        assert_eq!(op.effective_at(), Some(later));
    }
}
