//! SQLite persistence for one trip per file. Every mutation runs as a
//! scoped critical section: begin an immediate transaction, read the full
//! snapshot, apply the change in memory, rewrite the full snapshot,
//! commit. Concurrent sessions on the same file serialize on the write
//! lock instead of overwriting each other.
//!
//! Loading is strict: a row that does not parse, or that names anyone not
//! on the roster, fails the whole load. There is no repaired or partial
//! result.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, Expense, ExpenseId, PaymentMethod};
use crate::roster::Roster;
use crate::trip::Trip;

const DATE_FORMAT: &str = "%Y-%m-%d";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to one trip's ledger file.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the ledger at `path`, creating the file and schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        create_tables(&conn)?;
        tracing::info!("store opened at {:?}", path.as_ref());
        Ok(Store { conn })
    }

    /// Read the current snapshot into a `Trip`.
    pub fn load(&self, roster: &Roster) -> LedgerResult<Trip> {
        load_snapshot(&self.conn, roster)
    }

    /// Record an expense and persist the updated snapshot in one critical
    /// section. Returns the new expense id.
    pub fn record_expense(
        &mut self,
        roster: &Roster,
        description: &str,
        category: Category,
        amount: Decimal,
        payer: &str,
        method: PaymentMethod,
        due_date: Option<NaiveDate>,
    ) -> LedgerResult<ExpenseId> {
        self.with_trip(roster, |trip| {
            trip.record_expense(description, category, amount, payer, method, due_date)
        })
    }

    /// Settle one participant's portion and persist, in one critical
    /// section.
    pub fn settle_portion(
        &mut self,
        roster: &Roster,
        id: ExpenseId,
        participant: &str,
    ) -> LedgerResult<()> {
        self.with_trip(roster, |trip| trip.settle_portion(id, participant))
    }

    /// Wipe every persisted expense in one transaction. All-or-nothing;
    /// callers drop their in-memory trip alongside.
    pub fn reset(&mut self) -> LedgerResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM expenses", [])?;
        tx.commit()?;
        tracing::info!("trip reset: all expenses cleared");
        Ok(())
    }

    /// The read-mutate-rewrite cycle shared by all mutations. A failing
    /// mutation rolls back and leaves the snapshot untouched.
    fn with_trip<T>(
        &mut self,
        roster: &Roster,
        apply: impl FnOnce(&mut Trip) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut trip = load_snapshot(&tx, roster)?;
        let out = apply(&mut trip)?;
        save_snapshot(&tx, &trip)?;
        tx.commit()?;
        Ok(out)
    }
}

fn create_tables(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            amount TEXT NOT NULL,
            payer TEXT NOT NULL,
            method TEXT NOT NULL,
            due_date TEXT,
            settled_by TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

struct RawRow {
    position: i64,
    id: String,
    description: String,
    category: String,
    amount: String,
    payer: String,
    method: String,
    due_date: Option<String>,
    settled_by: String,
}

fn load_snapshot(conn: &Connection, roster: &Roster) -> LedgerResult<Trip> {
    let mut stmt = conn.prepare(
        "SELECT position, id, description, category, amount, payer, method, due_date, settled_by
         FROM expenses ORDER BY position ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RawRow {
            position: row.get(0)?,
            id: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            amount: row.get(4)?,
            payer: row.get(5)?,
            method: row.get(6)?,
            due_date: row.get(7)?,
            settled_by: row.get(8)?,
        })
    })?;
    let mut expenses = Vec::new();
    for row in rows {
        expenses.push(parse_row(row?, roster)?);
    }
    tracing::debug!("loaded snapshot: {} expenses", expenses.len());
    Ok(Trip::from_parts(roster.clone(), expenses))
}

fn save_snapshot(conn: &Connection, trip: &Trip) -> LedgerResult<()> {
    conn.execute("DELETE FROM expenses", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO expenses (id, position, description, category, amount, payer, method, due_date, settled_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (position, e) in trip.expenses().iter().enumerate() {
        let settled: Vec<&str> = e.settled_by.iter().map(String::as_str).collect();
        let settled_json = serde_json::to_string(&settled)?;
        stmt.execute(params![
            e.id.to_string(),
            position as i64,
            e.description,
            e.category.as_str(),
            e.amount.to_string(),
            e.payer,
            e.method.as_str(),
            e.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            settled_json,
        ])?;
    }
    tracing::debug!("saved snapshot: {} expenses", trip.expenses().len());
    Ok(())
}

fn corrupt(row: i64, detail: String) -> LedgerError {
    LedgerError::CorruptLedgerRecord { row, detail }
}

/// Strict row decoding; any malformed cell fails the whole load.
fn parse_row(raw: RawRow, roster: &Roster) -> LedgerResult<Expense> {
    let row = raw.position;
    let id = Uuid::parse_str(&raw.id)
        .map_err(|_| corrupt(row, format!("bad expense id {:?}", raw.id)))?;
    let category = Category::from_str(&raw.category)
        .ok_or_else(|| corrupt(row, format!("unknown category {:?}", raw.category)))?;
    let amount: Decimal = raw
        .amount
        .parse()
        .map_err(|_| corrupt(row, format!("bad amount {:?}", raw.amount)))?;
    if amount <= Decimal::ZERO {
        return Err(corrupt(row, format!("non-positive amount {}", amount)));
    }
    if !roster.contains(&raw.payer) {
        return Err(corrupt(
            row,
            format!("payer {:?} is not on the roster", raw.payer),
        ));
    }
    let method = PaymentMethod::from_str(&raw.method)
        .ok_or_else(|| corrupt(row, format!("unknown payment method {:?}", raw.method)))?;
    let due_date = match raw.due_date {
        Some(s) => Some(
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|_| corrupt(row, format!("bad due date {:?}", s)))?,
        ),
        None => None,
    };
    let names: Vec<String> = serde_json::from_str(&raw.settled_by).map_err(|_| {
        corrupt(
            row,
            format!("settled_by is not a name list: {:?}", raw.settled_by),
        )
    })?;
    let mut settled_by = BTreeSet::new();
    for name in names {
        if !roster.contains(&name) {
            return Err(corrupt(
                row,
                format!("settled name {:?} is not on the roster", name),
            ));
        }
        if !settled_by.insert(name.clone()) {
            return Err(corrupt(row, format!("duplicate settled name {:?}", name)));
        }
    }
    Ok(Expense {
        id,
        description: raw.description,
        category,
        amount,
        payer: raw.payer,
        method,
        due_date,
        settled_by,
    })
}
