//! Core data models for the budget ledger
//!
//! This module contains the value objects and entities of the budgeting
//! domain: money and exchange rates, budgets and their monthly periods,
//! currencies, expense requests, posted transactions and spending insights.

pub mod budget;
pub mod currency;
pub mod expense;
pub mod ids;
pub mod insights;
pub mod money;
pub mod operation;
pub mod period;
pub mod transaction;

pub use budget::{Budget, BUDGET_UPDATE_SCHEMA};
pub use currency::Currency;
pub use expense::{Expense, EXPENSE_UPDATE_SCHEMA};
pub use ids::{
    BudgetId, BudgetPeriodId, ExpenseId, IdGenerator, SequenceGenerator, TransactionId,
    UuidGenerator,
};
pub use insights::{
    SpendingAggregate, SpendingBudgetSummary, SpendingInsights, SpendingSeries,
    SpendingTrendPeriod,
};
pub use money::{CurrencyCode, ExchangeRate, Money, MoneyError, DEFAULT_BASE_CURRENCY};
pub use operation::Operation;
pub use period::{BudgetPeriod, Month};
pub use transaction::{Transaction, TransactionType};
