//! Shared-trip expense ledger: who fronted what, who has settled their
//! share, and who still owes whom.
//!
//! A trip is a fixed roster of participants (some answering for others'
//! shares) plus an append-only log of expenses split equally across the
//! roster. [`Trip`] is the in-memory aggregate, [`ledger`] derives
//! balances, alerts and totals from it, and [`Store`] persists full
//! snapshots to SQLite with one critical section per mutation. Setup
//! flows, rendering and currency pickers live in the embedding
//! application, not here.

pub mod error;
pub mod ledger;
pub mod models;
pub mod roster;
pub mod storage;
pub mod trip;

pub use error::{LedgerError, LedgerResult};
pub use models::{to_base_currency, Category, Expense, ExpenseId, PaymentMethod};
pub use roster::Roster;
pub use storage::Store;
pub use trip::Trip;
