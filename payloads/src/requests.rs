use crate::{
    AccountId, AccountStatus, CounterpartyId, PaymentMethod, RecurrenceKind,
    SourceDocumentId,
};
use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const INVOICE_NUMBER_MAX_LEN: usize = 64;
pub const NOTES_MAX_LEN: usize = 2000;

/// Body for creating a payable or receivable account.
///
/// `details` is `PayableDetails` or `ReceivableDetails` depending on the
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccount<T> {
    pub description: String,
    pub counterparty_id: Option<CounterpartyId>,
    pub source_document_id: Option<SourceDocumentId>,
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub penalty: Decimal,
    /// Defaults to the current UTC date.
    pub issue_date: Option<Date>,
    pub due_date: Date,
    #[serde(default)]
    pub recurring: bool,
    pub recurrence_kind: Option<RecurrenceKind>,
    pub notes: Option<String>,
    #[serde(default)]
    pub details: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleAccount {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to the current UTC date.
    pub settled_on: Option<Date>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListAccounts {
    pub status: Option<AccountStatus>,
}
