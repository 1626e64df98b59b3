//! Data models for trip expenses.
//! Amounts are `rust_decimal::Decimal` in the trip's base currency; the
//! per-person share is always derived, never stored.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

/// Expense ids are v4 UUIDs minted at record time.
pub type ExpenseId = Uuid;

/// How an expense was paid. Credit purchases carry a due date and feed
/// the due-soon alerts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    InstantTransfer,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::InstantTransfer => "instant_transfer",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "instant_transfer" => Some(PaymentMethod::InstantTransfer),
            "credit" => Some(PaymentMethod::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Lodging,
    Leisure,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Lodging => "lodging",
            Category::Leisure => "leisure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "food" => Some(Category::Food),
            "transport" => Some(Category::Transport),
            "lodging" => Some(Category::Lodging),
            "leisure" => Some(Category::Leisure),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded expense, split equally across the whole roster.
/// `settled_by` only ever grows; clearing a name again is an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub category: Category,
    pub amount: Decimal,
    pub payer: String,
    pub method: PaymentMethod,
    pub due_date: Option<NaiveDate>,
    pub settled_by: BTreeSet<String>,
}

impl Expense {
    pub fn is_settled_by(&self, name: &str) -> bool {
        self.settled_by.contains(name)
    }
}

/// Convert an amount entered in a foreign currency into the trip's base
/// currency at a fixed rate. Callers apply this before recording; the
/// ledger itself is single-currency.
pub fn to_base_currency(amount: Decimal, rate: Decimal) -> LedgerResult<Decimal> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidExchangeRate(rate));
    }
    Ok(amount * rate)
}
