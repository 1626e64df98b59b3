//! Error taxonomy for roster setup, ledger mutations, and storage.
//! Every failure is raised before any state changes; callers never see
//! partial effects.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::ExpenseId;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("trip roster must have at least one participant")]
    EmptyRoster,

    #[error("duplicate participant: {0}")]
    DuplicateParticipant(String),

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("{participant} answers to {responsible}, who is a dependent themselves")]
    InvalidResponsibilityMap {
        participant: String,
        responsible: String,
    },

    #[error("expense amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("exchange rate must be positive, got {0}")]
    InvalidExchangeRate(Decimal),

    #[error("unknown expense: {0}")]
    UnknownExpense(ExpenseId),

    #[error("{participant} already settled their portion of expense {expense}")]
    AlreadySettled {
        expense: ExpenseId,
        participant: String,
    },

    #[error("corrupt ledger record at row {row}: {detail}")]
    CorruptLedgerRecord { row: i64, detail: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
