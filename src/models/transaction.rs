//! Transaction model
//!
//! A posted, immutable ledger entry. Transactions are produced from requests
//! such as [`Expense`](super::Expense) and only change again through
//! [`Expense::update_transaction`](super::Expense::update_transaction).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{BudgetId, BudgetPeriodId, TransactionId};
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

/// Kind of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::Validation(format!(
                "unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// A posted financial event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Budget the transaction counts against (required for expenses)
    pub budget_id: Option<BudgetId>,

    /// Period the transaction was posted to (required for expenses)
    pub budget_period_id: Option<BudgetPeriodId>,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Amount in the currency it was spent in
    pub amount: Money,

    /// `amount` converted into the base currency
    pub base_amount: Money,

    /// Rate used to produce `base_amount`
    pub exchange_rate: Decimal,

    /// When the transaction happened
    pub date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Validate the transaction's invariants
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.id.is_valid() {
            return Err(LedgerError::Validation(format!(
                "invalid transaction id: {:?}",
                self.id.as_str()
            )));
        }

        if !self.amount.is_positive() {
            return Err(LedgerError::Validation(
                "transaction amount must be positive".into(),
            ));
        }
        self.amount.validate()?;

        if !self.base_amount.is_positive() {
            return Err(LedgerError::Validation(
                "transaction base amount must be positive".into(),
            ));
        }
        self.base_amount.validate()?;

        if self.exchange_rate <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "transaction exchange rate must be positive".into(),
            ));
        }

        if self.is_expense() {
            if !self.budget_id.as_ref().is_some_and(BudgetId::is_valid) {
                return Err(LedgerError::Validation(
                    "expense transaction requires a valid budget id".into(),
                ));
            }
            if !self
                .budget_period_id
                .as_ref()
                .is_some_and(BudgetPeriodId::is_valid)
            {
                return Err(LedgerError::Validation(
                    "expense transaction requires a valid budget period id".into(),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ({})",
            self.date.format("%Y-%m-%d"),
            self.kind,
            self.title,
            self.amount,
            self.base_amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::CurrencyCode;

    fn expense() -> Transaction {
        let now = Utc::now();
        Transaction {
            id: TransactionId::new("trx_1"),
            kind: TransactionType::Expense,
            budget_id: Some(BudgetId::new("bdg_1")),
            budget_period_id: Some(BudgetPeriodId::new("bpd_1")),
            title: "Groceries run".into(),
            description: String::new(),
            amount: Money::new(1000, CurrencyCode::new("EUR")),
            base_amount: Money::new(1080, CurrencyCode::base()),
            exchange_rate: Decimal::new(108, 2),
            date: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_valid_expense() {
        assert!(expense().validate().is_ok());
        assert!(expense().is_expense());
    }

    #[test]
    fn test_expense_requires_budget_and_period() {
        let mut trx = expense();
        trx.budget_id = None;
        assert!(trx.validate().is_err());

        let mut trx = expense();
        trx.budget_period_id = Some(BudgetPeriodId::new("bdg_1"));
        assert!(trx.validate().is_err());
    }

    #[test]
    fn test_base_amount_and_rate_positive() {
        let mut trx = expense();
        trx.base_amount = Money::new(0, CurrencyCode::base());
        assert!(trx.validate().is_err());

        let mut trx = expense();
        trx.exchange_rate = Decimal::ZERO;
        assert!(trx.validate().is_err());
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert_eq!(" Expense ".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_type_serialization() {
        let json = serde_json::to_value(expense()).unwrap();
        assert_eq!(json["type"], "expense");

        let mut raw = json.clone();
        raw["type"] = serde_json::Value::from("refund");
        assert!(serde_json::from_value::<Transaction>(raw).is_err());
    }
}
