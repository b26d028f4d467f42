//! Currency service
//!
//! Maintains the tenant's currencies and their rates. A rate change is
//! pushed explicitly into the open periods of every budget denominated in
//! that currency.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::period::resync_periods;
use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Currency, CurrencyCode, ExchangeRate, Month};
use crate::storage::Storage;

/// Service for currency management
pub struct CurrencyService<'a> {
    storage: &'a Storage,
}

/// Outcome of [`CurrencyService::upsert`]
#[derive(Debug, Clone)]
pub struct CurrencyUpdate {
    pub currency: Currency,
    /// Open periods whose base amounts were recomputed
    pub resynced_periods: usize,
}

impl<'a> CurrencyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a currency or change its name and rate
    ///
    /// When the rate changes, periods from the current month onward are
    /// resynced for every budget in this currency. Closed periods keep the
    /// rate they were frozen with.
    pub fn upsert(&self, code: &str, name: &str, rate: Decimal) -> LedgerResult<CurrencyUpdate> {
        let code = CurrencyCode::parse(code)?;
        if code == CurrencyCode::base() && rate != Decimal::ONE {
            return Err(LedgerError::Validation(format!(
                "base currency {} must have rate 1, got {}",
                code, rate
            )));
        }

        let Some(existing) = self.storage.currencies.get(&code)? else {
            let currency = Currency::new(code, name, rate);
            currency.validate()?;
            self.storage.currencies.store(&currency)?;
            self.storage.log_create(
                EntityType::Currency,
                currency.code.to_string(),
                Some(currency.name.clone()),
                &currency,
            )?;
            info!(code = %currency.code, rate = %currency.rate, "currency added");
            return Ok(CurrencyUpdate {
                currency,
                resynced_periods: 0,
            });
        };

        let mut currency = existing.clone();
        currency.name = name.trim().to_string();
        currency.rate = rate;
        currency.validate()?;

        if currency == existing {
            debug!(code = %currency.code, "currency unchanged");
            return Ok(CurrencyUpdate {
                currency,
                resynced_periods: 0,
            });
        }

        currency.updated_at = Utc::now();
        self.storage.currencies.store(&currency)?;
        self.storage.log_update(
            EntityType::Currency,
            currency.code.to_string(),
            Some(currency.name.clone()),
            &existing,
            &currency,
        )?;

        let resynced_periods = if currency.rate != existing.rate {
            self.propagate_rate(&currency)?
        } else {
            0
        };

        info!(
            code = %currency.code,
            from = %existing.rate,
            to = %currency.rate,
            resynced_periods,
            "currency updated"
        );
        Ok(CurrencyUpdate {
            currency,
            resynced_periods,
        })
    }

    pub fn get(&self, code: &CurrencyCode) -> LedgerResult<Option<Currency>> {
        self.storage.currencies.get(code)
    }

    pub fn list(&self) -> LedgerResult<Vec<Currency>> {
        self.storage.currencies.list()
    }

    /// The stored currency, or the implicit base currency at rate 1
    pub fn resolve(&self, code: &CurrencyCode) -> LedgerResult<Currency> {
        match self.storage.currencies.get(code)? {
            Some(currency) => Ok(currency),
            None if *code == CurrencyCode::base() => Ok(Currency::base(code.as_str())),
            None => Err(LedgerError::currency_not_found(code.as_str())),
        }
    }

    /// Current rate converting `code` into the base currency
    pub fn exchange_rate(&self, code: &CurrencyCode) -> LedgerResult<ExchangeRate> {
        Ok(self.resolve(code)?.exchange_rate())
    }

    fn propagate_rate(&self, currency: &Currency) -> LedgerResult<usize> {
        let since = Month::containing(Utc::now());
        let mut resynced = 0;
        for budget in self.storage.budgets.list()? {
            if budget.currency() == &currency.code {
                resynced += resync_periods(self.storage, &budget, currency, since)?.len();
            }
        }
        Ok(resynced)
    }
}
