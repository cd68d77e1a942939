//! Payable and receivable accounts and their lifecycle.
//!
//! ```text
//!            settle (partial)          settle (rest)
//! Pending ------------------> PartiallySettled ------------> Settled
//!    |  \                        |      ^                      ^
//!    |   \ due date passes       |      | settle (partial)     |
//!    |    `------------> Overdue <------'                      |
//!    |                     |  `------------------------------'
//!    |                     |            settle (rest)
//!    `---------------------+----------> Cancelled
//! ```
//!
//! `Settled` and `Cancelled` are terminal. A settled recurring account may
//! spawn one successor (see [`recurrence`]), which is a new account rather
//! than a transition of the old one.
//!
//! ## Status is a cached projection
//!
//! `Overdue` is only ever set by [`Account::refresh_status`], which the overdue
//! sweep runs for every open account. [`Account::is_overdue`] reads that
//! stored status (together with the due date) and does not recompute it, so
//! an account whose due date passed since the last sweep still reports
//! `Pending` and accrues no interest until the sweep visits it.

pub mod direction;
pub mod money;
pub mod policy;
pub mod recurrence;

use jiff::{Timestamp, civil::Date};
use payloads::{
    AccountId, AccountNumber, AccountStatus, CounterpartyId, PaymentMethod,
    RecurrenceKind, SourceDocumentId, requests, responses,
};
use rust_decimal::Decimal;

pub use direction::{Direction, Payable, Receivable};

use crate::time::utc_date;

#[derive(Debug, Clone, PartialEq)]
pub struct Account<D: Direction> {
    pub id: AccountId,
    pub number: AccountNumber,
    pub description: String,
    pub counterparty_id: Option<CounterpartyId>,
    /// Denormalized supplier/client name at the time of creation.
    pub counterparty_name: Option<String>,
    pub source_document_id: Option<SourceDocumentId>,
    pub invoice_number: Option<String>,
    /// Original amount.
    pub amount: Decimal,
    pub discount: Decimal,
    pub interest: Decimal,
    pub penalty: Decimal,
    /// Total paid (payable) or received (receivable) so far.
    pub settled_amount: Decimal,
    pub issue_date: Date,
    pub due_date: Date,
    pub settled_on: Option<Date>,
    pub settlement_method: Option<PaymentMethod>,
    pub status: AccountStatus,
    pub recurring: bool,
    pub recurrence_kind: Option<RecurrenceKind>,
    /// The settled recurring account this one was generated from.
    pub predecessor_id: Option<AccountId>,
    pub notes: Option<String>,
    pub details: D::Details,
    pub is_deleted: bool,
    /// Incremented on every write; used for compare-and-swap at the store.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything about an account that exists before the store assigns it an
/// identity and number.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDraft<D: Direction> {
    pub description: String,
    pub counterparty_id: Option<CounterpartyId>,
    pub counterparty_name: Option<String>,
    pub source_document_id: Option<SourceDocumentId>,
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    pub discount: Decimal,
    pub penalty: Decimal,
    pub issue_date: Date,
    pub due_date: Date,
    pub recurring: bool,
    pub recurrence_kind: Option<RecurrenceKind>,
    pub predecessor_id: Option<AccountId>,
    pub notes: Option<String>,
    pub details: D::Details,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("Account {0} is already settled")]
    AlreadySettled(AccountNumber),
    #[error("Account {0} is cancelled")]
    AlreadyCancelled(AccountNumber),
    #[error("Amount {amount} exceeds remaining balance of {remaining}")]
    Overpayment { amount: Decimal, remaining: Decimal },
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("Date out of range: {0} plus one {1} cadence")]
    DateOutOfRange(Date, RecurrenceKind),
}

impl AccountError {
    /// Whether the error is an attempt to move an account somewhere its
    /// lifecycle doesn't allow, as opposed to malformed input.
    pub fn is_state_transition(&self) -> bool {
        matches!(
            self,
            Self::AlreadySettled(_)
                | Self::AlreadyCancelled(_)
                | Self::Overpayment { .. }
        )
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl<D: Direction> AccountDraft<D> {
    /// Build a draft from a creation request. The counterparty name is filled
    /// in separately once the counterparty has been looked up.
    pub fn from_request(
        request: &requests::CreateAccount<D::Details>,
        today: Date,
    ) -> Self {
        Self {
            description: request.description.trim().to_string(),
            counterparty_id: request.counterparty_id,
            counterparty_name: None,
            source_document_id: request.source_document_id,
            invoice_number: request.invoice_number.clone(),
            amount: request.amount,
            discount: request.discount,
            penalty: request.penalty,
            issue_date: request.issue_date.unwrap_or(today),
            due_date: request.due_date,
            recurring: request.recurring,
            recurrence_kind: request.recurrence_kind,
            predecessor_id: None,
            notes: request.notes.clone(),
            details: request.details.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), AccountError> {
        if self.description.trim().is_empty() {
            return Err(AccountError::invalid("description", "must not be empty"));
        }
        if self.description.len() > requests::DESCRIPTION_MAX_LEN {
            return Err(AccountError::invalid(
                "description",
                format!("longer than {} bytes", requests::DESCRIPTION_MAX_LEN),
            ));
        }
        if let Some(invoice) = &self.invoice_number
            && invoice.len() > requests::INVOICE_NUMBER_MAX_LEN
        {
            return Err(AccountError::invalid(
                "invoice_number",
                format!(
                    "longer than {} bytes",
                    requests::INVOICE_NUMBER_MAX_LEN
                ),
            ));
        }
        if let Some(notes) = &self.notes
            && notes.len() > requests::NOTES_MAX_LEN
        {
            return Err(AccountError::invalid(
                "notes",
                format!("longer than {} bytes", requests::NOTES_MAX_LEN),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(self.amount));
        }
        if self.discount < Decimal::ZERO {
            return Err(AccountError::invalid("discount", "must not be negative"));
        }
        if self.penalty < Decimal::ZERO {
            return Err(AccountError::invalid("penalty", "must not be negative"));
        }
        if self.discount >= self.amount + self.penalty {
            return Err(AccountError::invalid(
                "discount",
                format!(
                    "{} leaves nothing due on amount plus penalty of {}",
                    self.discount,
                    self.amount + self.penalty
                ),
            ));
        }
        if self.due_date < self.issue_date {
            return Err(AccountError::invalid(
                "due_date",
                format!(
                    "{} is before issue date {}",
                    self.due_date, self.issue_date
                ),
            ));
        }
        if self.recurring && self.recurrence_kind.is_none() {
            return Err(AccountError::invalid(
                "recurrence_kind",
                "required for recurring accounts",
            ));
        }
        Ok(())
    }
}

impl<D: Direction> Account<D> {
    /// A freshly created account: pending, nothing settled, no interest.
    pub fn open(
        draft: AccountDraft<D>,
        id: AccountId,
        number: AccountNumber,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            number,
            description: draft.description,
            counterparty_id: draft.counterparty_id,
            counterparty_name: draft.counterparty_name,
            source_document_id: draft.source_document_id,
            invoice_number: draft.invoice_number,
            amount: draft.amount,
            discount: draft.discount,
            interest: Decimal::ZERO,
            penalty: draft.penalty,
            settled_amount: Decimal::ZERO,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            settled_on: None,
            settlement_method: None,
            status: AccountStatus::Pending,
            recurring: draft.recurring,
            recurrence_kind: draft.recurrence_kind,
            predecessor_id: draft.predecessor_id,
            notes: draft.notes,
            details: draft.details,
            is_deleted: false,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount plus interest and penalty, less discount.
    pub fn total_due(&self) -> Decimal {
        money::total_due(self.amount, self.interest, self.penalty, self.discount)
    }

    /// What is still owed.
    pub fn remaining(&self) -> Decimal {
        self.total_due() - self.settled_amount
    }

    pub fn can_be_settled(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether the stored status says overdue and the due date has passed.
    ///
    /// This reads the status the last refresh left behind; it does not compare
    /// dates to decide overdue-ness on its own.
    pub fn is_overdue(&self, today: Date) -> bool {
        today > self.due_date && self.status == AccountStatus::Overdue
    }

    /// Apply a payment (payable) or receipt (receivable).
    ///
    /// On error the account is left untouched.
    pub fn settle(
        &mut self,
        amount: Decimal,
        method: PaymentMethod,
        settled_on: Option<Date>,
        now: Timestamp,
    ) -> Result<(), AccountError> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(amount));
        }
        match self.status {
            AccountStatus::Settled => {
                return Err(AccountError::AlreadySettled(self.number));
            }
            AccountStatus::Cancelled => {
                return Err(AccountError::AlreadyCancelled(self.number));
            }
            _ => {}
        }
        let remaining = self.remaining();
        if amount > remaining {
            return Err(AccountError::Overpayment { amount, remaining });
        }

        self.settled_amount += amount;
        self.settlement_method = Some(method);
        self.settled_on = Some(settled_on.unwrap_or_else(|| utc_date(now)));
        if self.settled_amount >= self.total_due() {
            self.status = AccountStatus::Settled;
        } else if self.settled_amount > Decimal::ZERO {
            self.status = AccountStatus::PartiallySettled;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Cancel an account that hasn't been settled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), AccountError> {
        if self.status == AccountStatus::Settled {
            return Err(AccountError::AlreadySettled(self.number));
        }
        self.status = AccountStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    pub fn into_response(self) -> responses::Account<D::Details> {
        let remaining = self.remaining();
        responses::Account {
            id: self.id,
            number: self.number,
            description: self.description,
            counterparty_id: self.counterparty_id,
            counterparty_name: self.counterparty_name,
            source_document_id: self.source_document_id,
            invoice_number: self.invoice_number,
            amount: self.amount,
            discount: self.discount,
            interest: self.interest,
            penalty: self.penalty,
            settled_amount: self.settled_amount,
            remaining,
            issue_date: self.issue_date,
            due_date: self.due_date,
            settled_on: self.settled_on,
            settlement_method: self.settlement_method,
            status: self.status,
            recurring: self.recurring,
            recurrence_kind: self.recurrence_kind,
            predecessor_id: self.predecessor_id,
            notes: self.notes,
            details: self.details,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
