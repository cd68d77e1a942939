//! Follow-on installments for recurring accounts.

use jiff::{ToSpan, civil::Date};
use payloads::RecurrenceKind;
use rust_decimal::Decimal;

use super::{Account, AccountDraft, AccountError, Direction};

/// The due date one cadence after `due_date`.
///
/// Month-based cadences clamp to the end of shorter months, so Jan 31 plus
/// one month is the last day of February.
pub fn next_due_date(
    due_date: Date,
    kind: RecurrenceKind,
) -> Result<Date, AccountError> {
    let next = match kind {
        RecurrenceKind::Weekly => due_date.checked_add(7.days()),
        RecurrenceKind::Biweekly => due_date.checked_add(15.days()),
        RecurrenceKind::Monthly | RecurrenceKind::Unrecognized => {
            due_date.checked_add(1.month())
        }
        RecurrenceKind::Bimonthly => due_date.checked_add(2.months()),
        RecurrenceKind::Quarterly => due_date.checked_add(3.months()),
        RecurrenceKind::Yearly => due_date.checked_add(12.months()),
    };
    next.map_err(|_| AccountError::DateOutOfRange(due_date, kind))
}

impl<D: Direction> Account<D> {
    /// The next installment of a recurring account, or `None` if the account
    /// doesn't recur.
    ///
    /// Doesn't look at or touch this account's status; callers only invoke it
    /// for settled accounts. The successor starts over: issued on this
    /// account's due date, nothing settled, no discount, interest or penalty.
    pub fn generate_next_installment(
        &self,
    ) -> Result<Option<AccountDraft<D>>, AccountError> {
        let Some(kind) = self.recurrence_kind.filter(|_| self.recurring) else {
            return Ok(None);
        };
        let due_date = next_due_date(self.due_date, kind)?;

        Ok(Some(AccountDraft {
            description: self.description.clone(),
            counterparty_id: self.counterparty_id,
            counterparty_name: self.counterparty_name.clone(),
            source_document_id: None,
            invoice_number: None,
            amount: self.amount,
            discount: Decimal::ZERO,
            penalty: Decimal::ZERO,
            issue_date: self.due_date,
            due_date,
            recurring: self.recurring,
            recurrence_kind: self.recurrence_kind,
            predecessor_id: Some(self.id),
            notes: self.notes.clone(),
            details: self.details.clone(),
        }))
    }
}
