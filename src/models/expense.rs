//! Expense request
//!
//! An [`Expense`] is a request to spend against a budget. It never persists
//! itself: it is converted into a [`Transaction`] posted to a
//! [`BudgetPeriod`], or used to patch an existing transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::ids::{BudgetId, ExpenseId, IdGenerator, TransactionId};
use super::money::{CurrencyCode, ExchangeRate, Money};
use super::operation::Operation;
use super::period::BudgetPeriod;
use super::transaction::{Transaction, TransactionType};
use crate::error::{LedgerError, LedgerResult};
use crate::fieldmask::{Field, FieldMask, Schema};

/// Fields an expense update may touch on its transaction
pub const EXPENSE_UPDATE_SCHEMA: Schema = Schema::new(
    "expense",
    &[
        Field::required("title", "3-50 characters"),
        Field::optional("description", "Up to 250 characters"),
        Field::required("amount", "Positive amount; the currency is fixed once posted"),
        Field::optional("exchange_rate", "Custom rate to the base currency"),
        Field::required("date", "When the expense happened"),
    ],
);

const CONVERSION_CONTEXT: &str = "cannot convert amount using exchange rate";

/// A request to record spending against a budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Assigned by [`Expense::initialize`]
    #[serde(default)]
    pub id: ExpenseId,

    pub budget_id: BudgetId,

    pub operation: Operation,
}

impl Expense {
    /// Create an uninitialized expense request
    pub fn new(budget_id: BudgetId, operation: Operation) -> Self {
        Self {
            id: ExpenseId::default(),
            budget_id,
            operation,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.id.is_empty()
    }

    /// Assign an ID and sanitize free text; allowed exactly once
    pub fn initialize(&mut self, ids: &dyn IdGenerator) -> LedgerResult<()> {
        if self.is_initialized() {
            return Err(LedgerError::InvalidArgument(format!(
                "expense {} is already initialized",
                self.id
            )));
        }
        self.id = ExpenseId::generate(ids);
        self.operation.sanitize();
        Ok(())
    }

    /// Full validation of a new expense
    pub fn validate_for_create(&self) -> LedgerResult<()> {
        if !self.id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid expense id: {:?}",
                self.id.as_str()
            )));
        }
        if !self.budget_id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid budget id: {:?}",
                self.budget_id.as_str()
            )));
        }
        self.operation.validate()
    }

    /// Validate the fields selected by `mask`
    ///
    /// An empty mask validates the whole operation. Otherwise only the
    /// masked fields are checked: a mask of `amount` does not require a
    /// title to be present.
    pub fn validate_for_update(&self, mask: &FieldMask) -> LedgerResult<()> {
        EXPENSE_UPDATE_SCHEMA.validate(mask)?;

        if mask.is_empty() {
            return self.operation.validate();
        }

        for path in mask.paths() {
            match path.as_str() {
                "title" => self.operation.validate_title()?,
                "description" => self.operation.validate_description()?,
                "amount" => self.operation.validate_amount()?,
                "exchange_rate" => self.operation.validate_exchange_rate()?,
                "date" => self.operation.validate_date()?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Convert the expense into a transaction posted to `period`
    ///
    /// The transaction amount is always in the period's currency: an amount
    /// without a currency adopts it, any other currency is rejected. `rate`
    /// must convert the period's currency; a custom rate on the operation
    /// overrides it. Nothing is returned unless the conversion succeeds.
    pub fn transaction(
        &self,
        period: &BudgetPeriod,
        rate: &ExchangeRate,
        ids: &dyn IdGenerator,
    ) -> LedgerResult<Transaction> {
        self.validate_for_create()?;

        if period.budget_id != self.budget_id {
            return Err(LedgerError::InvalidArgument(format!(
                "period {} belongs to budget {}, not {}",
                period.id, period.budget_id, self.budget_id
            )));
        }

        let date = self
            .operation
            .date
            .ok_or_else(|| LedgerError::Validation("date is required".into()))?;
        let effective = self.operation.effective_at().unwrap_or(date);
        if !period.contains(effective) {
            return Err(LedgerError::InvalidArgument(format!(
                "expense dated {} falls outside period {}",
                effective.format("%Y-%m-%d"),
                period.month()
            )));
        }

        let currency = period.amount.currency();
        let amount = self.amount_in(currency);
        if !amount.same_currency(&period.amount) {
            return Err(LedgerError::Validation(format!(
                "expense in {} cannot be posted to a {} period",
                amount.currency(),
                currency
            )));
        }

        let base = period.base_amount.currency();
        let rate = match self.operation.exchange_rate {
            Some(custom) => ExchangeRate::new(currency.clone(), custom, currency == base),
            None => rate.clone(),
        };
        let base_amount = rate
            .convert_money(&amount, base)
            .map_err(|e| LedgerError::conversion(CONVERSION_CONTEXT, e))?;

        let now = Utc::now();
        let trx = Transaction {
            id: TransactionId::generate(ids),
            kind: TransactionType::Expense,
            budget_id: Some(self.budget_id.clone()),
            budget_period_id: Some(period.id.clone()),
            title: self.operation.title.trim().to_string(),
            description: self.operation.description.trim().to_string(),
            amount,
            base_amount,
            exchange_rate: rate.rate,
            date,
            created_at: now,
            updated_at: now,
        };

        trx.validate()?;
        Ok(trx)
    }

    /// Apply the masked fields of this expense to an existing transaction
    ///
    /// Touching `amount` or `exchange_rate` always recomputes the base
    /// amount, using the transaction's current rate when the rate itself is
    /// not part of the update. The transaction is left untouched on error.
    pub fn update_transaction(&self, trx: &mut Transaction, mask: &FieldMask) -> LedgerResult<()> {
        self.validate_for_update(mask)?;

        if !trx.is_expense() {
            return Err(LedgerError::InvalidArgument(format!(
                "transaction {} is not an expense",
                trx.id
            )));
        }

        let mut updated = trx.clone();

        if mask.contains("title") {
            updated.title = self.operation.title.trim().to_string();
        }
        if mask.contains("description") {
            updated.description = self.operation.description.trim().to_string();
        }
        if mask.contains("date") {
            updated.date = self
                .operation
                .date
                .ok_or_else(|| LedgerError::Validation("date is required".into()))?;
        }

        let amount_touched = mask.contains("amount");
        let rate_touched = mask.contains("exchange_rate");

        if amount_touched {
            let amount = self.amount_in(trx.amount.currency());
            if !amount.same_currency(&trx.amount) {
                return Err(LedgerError::Validation(format!(
                    "transaction currency cannot change from {} to {}",
                    trx.amount.currency(),
                    amount.currency()
                )));
            }
            updated.amount = amount;
        }
        if rate_touched {
            if let Some(rate) = self.operation.exchange_rate {
                updated.exchange_rate = rate;
            }
        }

        if amount_touched || rate_touched {
            let base = trx.base_amount.currency();
            let rate = ExchangeRate::new(
                updated.amount.currency().clone(),
                updated.exchange_rate,
                updated.amount.currency() == base,
            );
            updated.base_amount = rate
                .convert_money(&updated.amount, base)
                .map_err(|e| LedgerError::conversion(CONVERSION_CONTEXT, e))?;
        }

        updated.validate()?;
        updated.updated_at = Utc::now();
        *trx = updated;
        Ok(())
    }

    fn amount_in(&self, fallback: &CurrencyCode) -> Money {
        let amount = &self.operation.amount;
        if amount.currency().is_empty() {
            Money::new(amount.cents(), fallback.clone())
        } else {
            amount.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::budget::Budget;
    use crate::models::currency::Currency;
    use crate::models::ids::SequenceGenerator;
    use chrono::{DateTime, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn nov(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, day, 10, 0, 0).unwrap()
    }

    fn usd(cents: i64) -> Money {
        Money::new(cents, CurrencyCode::base())
    }

    fn eur(cents: i64) -> Money {
        Money::new(cents, CurrencyCode::new("EUR"))
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn usd_period(ids: &SequenceGenerator) -> BudgetPeriod {
        let budget = Budget::create(ids, "Groceries", usd(50000));
        budget
            .create_period(&Currency::base("US Dollar"), nov(1), ids)
            .unwrap()
    }

    fn eur_period(ids: &SequenceGenerator) -> BudgetPeriod {
        let budget = Budget::create(ids, "Travel", eur(20000));
        let euro = Currency::new(CurrencyCode::new("EUR"), "Euro", dec("1.10"));
        budget.create_period(&euro, nov(1), ids).unwrap()
    }

    fn expense_for(period: &BudgetPeriod, amount: Money) -> Expense {
        Expense::new(
            period.budget_id.clone(),
            Operation::new("  Weekly shop ", amount, nov(12)),
        )
    }

    fn posted(ids: &SequenceGenerator) -> Transaction {
        let period = eur_period(ids);
        let mut expense = expense_for(&period, eur(1000));
        expense.initialize(ids).unwrap();
        let rate = ExchangeRate::new(CurrencyCode::new("EUR"), dec("1.10"), false);
        expense.transaction(&period, &rate, ids).unwrap()
    }

    #[test]
    fn test_initialize_once() {
        let ids = SequenceGenerator::new();
        let mut expense = Expense::new(BudgetId::new("bdg_1"), Operation::new("  Lunch ", usd(900), nov(3)));

        expense.initialize(&ids).unwrap();
        assert_eq!(expense.id.as_str(), "exp_1");
        assert_eq!(expense.operation.title, "Lunch");

        let err = expense.initialize(&ids).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(expense.id.as_str(), "exp_1");
    }

    #[test]
    fn test_validate_for_create() {
        let ids = SequenceGenerator::new();
        let mut expense = Expense::new(BudgetId::new("bdg_1"), Operation::new("Lunch", usd(900), nov(3)));
        assert!(expense.validate_for_create().is_err());

        expense.initialize(&ids).unwrap();
        assert!(expense.validate_for_create().is_ok());

        expense.budget_id = BudgetId::new("nope");
        assert!(expense.validate_for_create().is_err());
    }

    #[test]
    fn test_validate_for_update_checks_only_masked_fields() {
        let mut expense = Expense::default();
        expense.operation.amount = usd(500);

        assert!(expense.validate_for_update(&FieldMask::new(["amount"])).is_ok());
        assert!(expense.validate_for_update(&FieldMask::new(["title"])).is_err());
        assert!(expense.validate_for_update(&FieldMask::all()).is_err());

        expense.operation.amount = usd(0);
        assert!(expense.validate_for_update(&FieldMask::new(["amount"])).is_err());
    }

    #[test]
    fn test_validate_for_update_rejects_unknown_paths() {
        let expense = Expense::default();
        let err = expense
            .validate_for_update(&FieldMask::new(["budget_id", "id"]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("budget_id"));
        assert!(message.contains("id"));
    }

    #[test]
    fn test_transaction_same_currency() {
        let ids = SequenceGenerator::new();
        let period = usd_period(&ids);
        let mut expense = expense_for(&period, usd(1000));
        expense.initialize(&ids).unwrap();

        let rate = ExchangeRate::new(CurrencyCode::base(), dec("1.0"), true);
        let trx = expense.transaction(&period, &rate, &ids).unwrap();

        assert_eq!(trx.kind, TransactionType::Expense);
        assert_eq!(trx.base_amount.cents(), 1000);
        assert_eq!(trx.exchange_rate, Decimal::ONE);
        assert_eq!(trx.budget_id.as_ref(), Some(&period.budget_id));
        assert_eq!(trx.budget_period_id.as_ref(), Some(&period.id));
        assert_eq!(trx.title, "Weekly shop");
        assert_eq!(trx.date, nov(12));
    }

    #[test]
    fn test_transaction_foreign_currency() {
        let ids = SequenceGenerator::new();
        let trx = posted(&ids);
        assert_eq!(trx.amount, eur(1000));
        assert_eq!(trx.base_amount, usd(1100));
        assert_eq!(trx.exchange_rate, dec("1.10"));
    }

    #[test]
    fn test_transaction_amount_in_period_currency() {
        let ids = SequenceGenerator::new();
        let period = usd_period(&ids);
        let euro_rate = ExchangeRate::new(CurrencyCode::new("EUR"), dec("1.10"), false);

        let mut foreign = expense_for(&period, eur(1000));
        foreign.initialize(&ids).unwrap();
        let err = foreign.transaction(&period, &euro_rate, &ids).unwrap_err();
        assert!(err.is_validation());

        let period = eur_period(&ids);
        let mut unlabelled = expense_for(&period, Money::new(1000, CurrencyCode::default()));
        unlabelled.initialize(&ids).unwrap();
        let trx = unlabelled.transaction(&period, &euro_rate, &ids).unwrap();
        assert_eq!(trx.amount.currency(), period.amount.currency());
        assert_eq!(trx.base_amount, usd(1100));
    }

    #[test]
    fn test_transaction_adopts_period_currency() {
        let ids = SequenceGenerator::new();
        let period = usd_period(&ids);
        let mut expense = expense_for(&period, Money::new(750, CurrencyCode::default()));
        expense.initialize(&ids).unwrap();

        let trx = expense
            .transaction(&period, &ExchangeRate::identity(CurrencyCode::base()), &ids)
            .unwrap();
        assert_eq!(trx.amount, usd(750));
    }

    #[test]
    fn test_custom_rate_overrides() {
        let ids = SequenceGenerator::new();
        let period = eur_period(&ids);
        let mut expense = expense_for(&period, eur(1000));
        expense.operation.exchange_rate = Some(dec("1.25"));
        expense.initialize(&ids).unwrap();

        let tenant_rate = ExchangeRate::new(CurrencyCode::new("EUR"), dec("1.10"), false);
        let trx = expense.transaction(&period, &tenant_rate, &ids).unwrap();
        assert_eq!(trx.base_amount, usd(1250));
        assert_eq!(trx.exchange_rate, dec("1.25"));
    }

    #[test]
    fn test_incompatible_rate_is_conversion_error() {
        let ids = SequenceGenerator::new();
        let period = eur_period(&ids);
        let mut expense = expense_for(&period, eur(1000));
        expense.initialize(&ids).unwrap();

        let gbp_rate = ExchangeRate::new(CurrencyCode::new("GBP"), dec("1.27"), false);
        let err = expense.transaction(&period, &gbp_rate, &ids).unwrap_err();
        assert!(err.is_conversion());
        assert!(err.to_string().starts_with(CONVERSION_CONTEXT));
    }

    #[test]
    fn test_transaction_rejects_foreign_period() {
        let ids = SequenceGenerator::new();
        let period = usd_period(&ids);
        let mut expense = Expense::new(BudgetId::new("bdg_99"), Operation::new("Lunch", usd(900), nov(3)));
        expense.initialize(&ids).unwrap();

        let err = expense
            .transaction(&period, &ExchangeRate::identity(CurrencyCode::base()), &ids)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_transaction_rejects_date_outside_period() {
        let ids = SequenceGenerator::new();
        let period = usd_period(&ids);
        let mut expense = expense_for(&period, usd(1000));
        expense.operation.date = Some(Utc.with_ymd_and_hms(2025, 12, 2, 0, 0, 0).unwrap());
        expense.initialize(&ids).unwrap();

        let err = expense
            .transaction(&period, &ExchangeRate::identity(CurrencyCode::base()), &ids)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_update_amount_uses_existing_rate() {
        let ids = SequenceGenerator::new();
        let mut trx = posted(&ids);
        let created = trx.clone();

        let mut patch = Expense::default();
        patch.operation.amount = Money::new(2000, CurrencyCode::default());
        patch
            .update_transaction(&mut trx, &FieldMask::new(["amount"]))
            .unwrap();

        assert_eq!(trx.amount, eur(2000));
        assert_eq!(trx.base_amount, usd(2200));
        assert_eq!(trx.exchange_rate, dec("1.10"));
        assert_eq!(trx.title, created.title);
        assert!(trx.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_rate_recomputes_base() {
        let ids = SequenceGenerator::new();
        let mut trx = posted(&ids);

        let mut patch = Expense::default();
        patch.operation.exchange_rate = Some(dec("1.20"));
        patch
            .update_transaction(&mut trx, &FieldMask::new(["exchange_rate"]))
            .unwrap();

        assert_eq!(trx.amount, eur(1000));
        assert_eq!(trx.base_amount, usd(1200));
        assert_eq!(trx.exchange_rate, dec("1.20"));
    }

    #[test]
    fn test_update_title_leaves_amounts() {
        let ids = SequenceGenerator::new();
        let mut trx = posted(&ids);
        let created = trx.clone();

        let mut patch = Expense::default();
        patch.operation.title = " Big shop ".into();
        patch
            .update_transaction(&mut trx, &FieldMask::new(["title"]))
            .unwrap();

        assert_eq!(trx.title, "Big shop");
        assert_eq!(trx.base_amount, created.base_amount);
        assert_eq!(trx.exchange_rate, created.exchange_rate);
    }

    #[test]
    fn test_update_rejects_currency_change() {
        let ids = SequenceGenerator::new();
        let mut trx = posted(&ids);
        let created = trx.clone();

        let mut patch = Expense::default();
        patch.operation.amount = usd(2000);
        let err = patch
            .update_transaction(&mut trx, &FieldMask::new(["amount"]))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(trx, created);
    }

    #[test]
    fn test_update_rejects_unknown_field() {
        let ids = SequenceGenerator::new();
        let mut trx = posted(&ids);
        let created = trx.clone();

        let patch = Expense::default();
        assert!(patch
            .update_transaction(&mut trx, &FieldMask::new(["budget_period_id"]))
            .is_err());
        assert_eq!(trx, created);
    }
}
