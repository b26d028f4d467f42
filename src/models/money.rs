//! Money type for representing currency amounts
//!
//! Amounts are stored as integer cents tagged with the currency they are
//! denominated in. Two amounts in different currencies never combine
//! implicitly; crossing currencies goes through an [`ExchangeRate`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency every converted amount is expressed in, unless a tenant says otherwise
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Errors raised by the money kernel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("exchange rate must be positive, got {0}")]
    InvalidRate(String),

    #[error("amount overflow")]
    Overflow,
}

/// ISO-4217 style currency code (three uppercase ASCII letters)
///
/// The empty code is representable so that zero-valued aggregates can adopt a
/// currency later; [`CurrencyCode::validate`] rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Wrap a code without validating it (surrounding whitespace is dropped)
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_string())
    }

    /// Parse and validate a code
    pub fn parse(code: impl AsRef<str>) -> Result<Self, MoneyError> {
        let code = Self::new(code);
        code.validate()?;
        Ok(code)
    }

    /// The process-wide default base currency
    pub fn base() -> Self {
        Self(DEFAULT_BASE_CURRENCY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the three-uppercase-letters shape
    pub fn is_valid(&self) -> bool {
        self.0.len() == 3 && self.0.bytes().all(|b| b.is_ascii_uppercase())
    }

    pub fn validate(&self) -> Result<(), MoneyError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MoneyError::InvalidCurrencyCode(self.0.clone()))
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A monetary amount in cents, tagged with its currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: CurrencyCode,
}

impl Money {
    /// Create an amount from cents and a currency
    ///
    /// # Examples
    /// ```
    /// use budget_ledger::models::{CurrencyCode, Money};
    /// let amount = Money::new(1050, CurrencyCode::new("USD")); // 10.50 USD
    /// assert_eq!(amount.cents(), 1050);
    /// ```
    pub fn new(cents: i64, currency: CurrencyCode) -> Self {
        Self { cents, currency }
    }

    /// Create a zero amount in the given currency
    pub fn zero(currency: CurrencyCode) -> Self {
        Self::new(0, currency)
    }

    /// Get the amount in cents
    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Validate the currency code
    pub fn validate(&self) -> Result<(), MoneyError> {
        self.currency.validate()
    }

    /// Add two amounts of the same currency
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(cents, self.currency.clone()))
    }

    /// Subtract an amount of the same currency
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let cents = self
            .cents
            .checked_sub(other.cents)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(cents, self.currency.clone()))
    }

    /// Convert into `target` by multiplying with `rate`
    ///
    /// The product is rounded once, half away from zero, to whole cents.
    pub fn exchange(&self, target: &CurrencyCode, rate: Decimal) -> Result<Money, MoneyError> {
        if rate <= Decimal::ZERO {
            return Err(MoneyError::InvalidRate(rate.to_string()));
        }
        target.validate()?;

        let converted = Decimal::from(self.cents)
            .checked_mul(rate)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let cents = converted.to_i64().ok_or(MoneyError::Overflow)?;

        Ok(Money::new(cents, target.clone()))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency.to_string(),
                actual: other.currency.to_string(),
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

/// Tenant-scoped conversion rate from `currency_code` into the base currency
///
/// `rate` is the value of one unit of `currency_code` expressed in the base
/// currency, so converting to base is a multiplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency_code: CurrencyCode,
    pub rate: Decimal,
    #[serde(default)]
    pub is_base: bool,
}

impl ExchangeRate {
    pub fn new(currency_code: CurrencyCode, rate: Decimal, is_base: bool) -> Self {
        Self {
            currency_code,
            rate,
            is_base,
        }
    }

    /// The identity rate of the base currency itself
    pub fn identity(base: CurrencyCode) -> Self {
        Self::new(base, Decimal::ONE, true)
    }

    pub fn validate(&self) -> Result<(), MoneyError> {
        self.currency_code.validate()?;
        if self.rate <= Decimal::ZERO {
            return Err(MoneyError::InvalidRate(self.rate.to_string()));
        }
        Ok(())
    }

    /// Convert `money` (denominated in this rate's currency) into `base`
    pub fn convert_money(&self, money: &Money, base: &CurrencyCode) -> Result<Money, MoneyError> {
        self.validate()?;
        if money.currency() != &self.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency_code.to_string(),
                actual: money.currency().to_string(),
            });
        }
        if self.is_base && &self.currency_code != base {
            return Err(MoneyError::CurrencyMismatch {
                expected: base.to_string(),
                actual: self.currency_code.to_string(),
            });
        }
        money.exchange(base, self.rate)
    }
}
