//! Currency model
//!
//! A tenant-known currency and its rate against the default base currency.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::{CurrencyCode, ExchangeRate};
use crate::error::{LedgerError, LedgerResult};

/// Maximum currency name length, in characters
pub const MAX_CURRENCY_NAME_LEN: usize = 50;

/// A currency with its current conversion rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO-4217 style code, also the identity of the currency
    pub code: CurrencyCode,

    /// Display name (e.g., "Euro")
    pub name: String,

    /// Value of one unit of this currency in the base currency
    pub rate: Decimal,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Currency {
    /// Create a new currency
    pub fn new(code: CurrencyCode, name: impl Into<String>, rate: Decimal) -> Self {
        let now = Utc::now();
        Self {
            code,
            name: name.into().trim().to_string(),
            rate,
            created_at: now,
            updated_at: now,
        }
    }

    /// The default base currency, at rate 1
    pub fn base(name: impl Into<String>) -> Self {
        Self::new(CurrencyCode::base(), name, Decimal::ONE)
    }

    pub fn is_base(&self) -> bool {
        self.code == CurrencyCode::base()
    }

    /// Replace the rate and stamp the update time
    pub fn set_rate(&mut self, rate: Decimal) {
        self.rate = rate;
        self.updated_at = Utc::now();
    }

    /// The exchange rate converting this currency into the base currency
    pub fn exchange_rate(&self) -> ExchangeRate {
        ExchangeRate::new(self.code.clone(), self.rate, self.is_base())
    }

    /// Validate the currency
    pub fn validate(&self) -> LedgerResult<()> {
        self.code.validate()?;

        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_CURRENCY_NAME_LEN {
            return Err(LedgerError::Validation(format!(
                "currency name must be 1-{} characters",
                MAX_CURRENCY_NAME_LEN
            )));
        }

        if self.rate <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "currency rate must be positive, got {}",
                self.rate
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) @ {}", self.name, self.code, self.rate)
    }
}
