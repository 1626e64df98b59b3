//! Trip aggregate: one roster plus the append-only expense log.
//! No process-global state; everything hangs off a `Trip` value that
//! callers own and pass around.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, Expense, ExpenseId, PaymentMethod};
use crate::roster::Roster;

#[derive(Clone, Debug)]
pub struct Trip {
    roster: Roster,
    expenses: Vec<Expense>,
}

impl Trip {
    pub fn new(roster: Roster) -> Self {
        Trip {
            roster,
            expenses: Vec::new(),
        }
    }

    /// Rebuild from expenses that storage already validated.
    pub(crate) fn from_parts(roster: Roster, expenses: Vec<Expense>) -> Self {
        Trip { roster, expenses }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Expenses in recording order.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Record an expense fronted by `payer`, split equally across the whole
    /// roster. The payer's responsibility group starts settled: the payer
    /// never owes themselves, and their dependents' shares are the payer's
    /// own problem. Existing expenses are untouched.
    pub fn record_expense(
        &mut self,
        description: &str,
        category: Category,
        amount: Decimal,
        payer: &str,
        method: PaymentMethod,
        due_date: Option<NaiveDate>,
    ) -> LedgerResult<ExpenseId> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let settled_by: BTreeSet<String> = self
            .roster
            .responsibility_group(payer)?
            .into_iter()
            .map(String::from)
            .collect();
        let id = Uuid::new_v4();
        tracing::debug!("record expense id={} payer={} amount={}", id, payer, amount);
        self.expenses.push(Expense {
            id,
            description: description.to_string(),
            category,
            amount,
            payer: payer.to_string(),
            method,
            due_date,
            settled_by,
        });
        Ok(id)
    }

    /// Mark `participant`'s portion of one expense as settled. Settlement
    /// is monotonic: a name cannot be cleared twice, and nothing ever
    /// leaves `settled_by`.
    pub fn settle_portion(&mut self, id: ExpenseId, participant: &str) -> LedgerResult<()> {
        if !self.roster.contains(participant) {
            return Err(LedgerError::UnknownParticipant(participant.to_string()));
        }
        let expense = self
            .expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LedgerError::UnknownExpense(id))?;
        if !expense.settled_by.insert(participant.to_string()) {
            return Err(LedgerError::AlreadySettled {
                expense: id,
                participant: participant.to_string(),
            });
        }
        tracing::debug!("settled portion expense={} participant={}", id, participant);
        Ok(())
    }

    /// Participants whose portion of `id` is still outstanding, in roster
    /// order. Empty means the expense is fully settled.
    pub fn pending_participants(&self, id: ExpenseId) -> LedgerResult<Vec<&str>> {
        let expense = self.expense(id).ok_or(LedgerError::UnknownExpense(id))?;
        Ok(self
            .roster
            .participants()
            .filter(|p| !expense.settled_by.contains(*p))
            .collect())
    }
}
