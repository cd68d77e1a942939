use crate::{
    AccountId, AccountNumber, AccountStatus, CounterpartyId, PaymentMethod,
    RecurrenceKind, SourceDocumentId,
};
use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A payable or receivable account as returned by the API.
///
/// `remaining` is derived: amount + interest + penalty - discount - settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account<T> {
    pub id: AccountId,
    pub number: AccountNumber,
    pub description: String,
    pub counterparty_id: Option<CounterpartyId>,
    pub counterparty_name: Option<String>,
    pub source_document_id: Option<SourceDocumentId>,
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    pub discount: Decimal,
    pub interest: Decimal,
    pub penalty: Decimal,
    pub settled_amount: Decimal,
    pub remaining: Decimal,
    pub issue_date: Date,
    pub due_date: Date,
    pub settled_on: Option<Date>,
    pub settlement_method: Option<PaymentMethod>,
    pub status: AccountStatus,
    pub recurring: bool,
    pub recurrence_kind: Option<RecurrenceKind>,
    pub predecessor_id: Option<AccountId>,
    pub notes: Option<String>,
    pub details: T,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub type PayableAccount = Account<crate::PayableDetails>;
pub type ReceivableAccount = Account<crate::ReceivableDetails>;

/// Outcome of one batch sweep over one kind of account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Accounts the sweep looked at.
    pub examined: usize,
    /// Accounts written (refreshed, or successors created).
    pub updated: usize,
    /// Accounts whose processing failed; logged individually.
    pub failed: usize,
}

impl std::ops::AddAssign for SweepReport {
    fn add_assign(&mut self, rhs: Self) {
        self.examined += rhs.examined;
        self.updated += rhs.updated;
        self.failed += rhs.failed;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub payables: SweepReport,
    pub receivables: SweepReport,
}
