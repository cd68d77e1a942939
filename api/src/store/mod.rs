//! Persistence boundary for payable and receivable accounts.
//!
//! ## Design Decisions
//!
//! ### One table, two directions
//! - Payables and receivables live in a single `accounts` table with a
//!   `kind` column. Every query is scoped to the kind of the store's
//!   [`Direction`], so a payable id never resolves through the receivable
//!   store.
//! - Direction-specific attributes are a JSON document in the `details`
//!   column, decoded into `D::Details` on read.
//!
//! ### Soft delete
//! - Accounts are never removed. Deleting flips `is_deleted`, and every read
//!   in this module ignores deleted rows.
//!
//! ### Concurrency
//! - **Optimistic writes**: each row carries a `version`. `replace_account`
//!   only succeeds against the version that was read and bumps it, so two
//!   concurrent settlements can't both land. The loser gets
//!   `StoreError::VersionConflict`; nothing here retries.
//! - **Account numbers**: `next_number` advances a per-kind counter in a
//!   single statement and `(kind, number)` is unique, so concurrent creations
//!   never share a number.
//! - **Successors**: at most one account may name a given predecessor. The
//!   recurring sweep can run any number of times without duplicating
//!   installments, and the settled source account is never rewritten.
//!
//! ### Time Source Dependency
//! - Functions that stamp rows take the timestamp from the caller's
//!   `TimeSource`, so time can be mocked during tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTs};
use payloads::{
    AccountId, AccountKind, AccountNumber, AccountStatus, CounterpartyId,
    PaymentMethod, RecurrenceKind, SourceDocumentId,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, types::Json};
use std::sync::Arc;

use crate::account::{Account, Direction, Payable, Receivable};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read/write contract for accounts of one direction.
#[async_trait]
pub trait AccountStore<D: Direction>: Send + Sync {
    /// An active account by id.
    async fn read_account(
        &self,
        id: &AccountId,
    ) -> Result<Account<D>, StoreError>;

    /// All active accounts, ordered by due date then number.
    async fn list_accounts(&self) -> Result<Vec<Account<D>>, StoreError>;

    async fn list_accounts_by_status(
        &self,
        status: AccountStatus,
    ) -> Result<Vec<Account<D>>, StoreError>;

    /// Active accounts that are neither settled nor cancelled.
    async fn list_open_accounts(&self) -> Result<Vec<Account<D>>, StoreError>;

    /// Active, recurring, settled accounts that haven't produced a successor
    /// yet.
    async fn list_recurring_settled_accounts(
        &self,
    ) -> Result<Vec<Account<D>>, StoreError>;

    /// Reserve the next sequence number for this kind of account.
    async fn next_number(&self) -> Result<AccountNumber, StoreError>;

    async fn insert_account(
        &self,
        account: &Account<D>,
    ) -> Result<(), StoreError>;

    /// Overwrite a stored account, provided its stored version still equals
    /// `account.version`. Returns the account as stored, with its new version.
    async fn replace_account(
        &self,
        account: &Account<D>,
    ) -> Result<Account<D>, StoreError>;

    async fn soft_delete_account(
        &self,
        id: &AccountId,
        now: Timestamp,
    ) -> Result<(), StoreError>;
}

/// Lookup of supplier (payable) and client (receivable) display names.
#[async_trait]
pub trait CounterpartyDirectory: Send + Sync {
    /// The display name of an active counterparty, if there is one.
    async fn counterparty_name(
        &self,
        kind: AccountKind,
        id: &CounterpartyId,
    ) -> Result<Option<String>, StoreError>;
}

/// The stores the service and scheduler work against.
#[derive(Clone)]
pub struct Stores {
    pub payables: Arc<dyn AccountStore<Payable>>,
    pub receivables: Arc<dyn AccountStore<Receivable>>,
    pub counterparties: Arc<dyn CounterpartyDirectory>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            payables: store.clone(),
            receivables: store.clone(),
            counterparties: store,
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            payables: store.clone(),
            receivables: store.clone(),
            counterparties: store,
        }
    }
}

#[derive(sqlx::Type)]
#[sqlx(transparent)]
struct OptionalDate(Option<SqlxDate>);

impl From<OptionalDate> for Option<Date> {
    fn from(x: OptionalDate) -> Option<Date> {
        x.0.map(|x| x.to_jiff())
    }
}

/// An `accounts` row, independent of direction.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: AccountId,
    pub kind: AccountKind,
    pub number: i32,
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
    #[sqlx(try_from = "SqlxDate")]
    pub issue_date: Date,
    #[sqlx(try_from = "SqlxDate")]
    pub due_date: Date,
    #[sqlx(try_from = "OptionalDate")]
    pub settled_on: Option<Date>,
    pub settlement_method: Option<PaymentMethod>,
    pub status: AccountStatus,
    pub recurring: bool,
    /// Free text so that unknown cadences survive a round trip.
    pub recurrence_kind: Option<String>,
    pub predecessor_id: Option<AccountId>,
    pub notes: Option<String>,
    pub details: Json<serde_json::Value>,
    pub is_deleted: bool,
    pub version: i64,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
    #[sqlx(try_from = "SqlxTs")]
    pub updated_at: Timestamp,
}

impl<D: Direction> TryFrom<AccountRow> for Account<D> {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        if row.kind != D::KIND {
            return Err(StoreError::InvalidRecord(format!(
                "account {} is a {} account, expected {}",
                row.id, row.kind, D::KIND
            )));
        }
        let details = serde_json::from_value(row.details.0).map_err(|e| {
            StoreError::InvalidRecord(format!(
                "account {} has malformed details: {e}",
                row.id
            ))
        })?;
        Ok(Account {
            id: row.id,
            number: AccountNumber::new(row.kind, row.number),
            description: row.description,
            counterparty_id: row.counterparty_id,
            counterparty_name: row.counterparty_name,
            source_document_id: row.source_document_id,
            invoice_number: row.invoice_number,
            amount: row.amount,
            discount: row.discount,
            interest: row.interest,
            penalty: row.penalty,
            settled_amount: row.settled_amount,
            issue_date: row.issue_date,
            due_date: row.due_date,
            settled_on: row.settled_on,
            settlement_method: row.settlement_method,
            status: row.status,
            recurring: row.recurring,
            recurrence_kind: row
                .recurrence_kind
                .as_deref()
                .map(RecurrenceKind::parse_lenient),
            predecessor_id: row.predecessor_id,
            notes: row.notes,
            details,
            is_deleted: row.is_deleted,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<D: Direction> Account<D> {
    pub fn to_row(&self) -> Result<AccountRow, StoreError> {
        let details = serde_json::to_value(&self.details)
            .map_err(|e| StoreError::UnexpectedError(e.into()))?;
        Ok(AccountRow {
            id: self.id,
            kind: D::KIND,
            number: self.number.seq,
            description: self.description.clone(),
            counterparty_id: self.counterparty_id,
            counterparty_name: self.counterparty_name.clone(),
            source_document_id: self.source_document_id,
            invoice_number: self.invoice_number.clone(),
            amount: self.amount,
            discount: self.discount,
            interest: self.interest,
            penalty: self.penalty,
            settled_amount: self.settled_amount,
            issue_date: self.issue_date,
            due_date: self.due_date,
            settled_on: self.settled_on,
            settlement_method: self.settlement_method,
            status: self.status,
            recurring: self.recurring,
            recurrence_kind: self.recurrence_kind.map(|k| k.to_string()),
            predecessor_id: self.predecessor_id,
            notes: self.notes.clone(),
            details: Json(details),
            is_deleted: self.is_deleted,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Account {0} was modified concurrently; reload it and try again")]
    VersionConflict(AccountNumber),
    #[error("Account number {0} is already taken")]
    DuplicateNumber(AccountNumber),
    #[error("Account {0} already has a successor installment")]
    SuccessorAlreadyExists(AccountId),
    #[error("Unique constraint violation")]
    NotUnique(#[source] sqlx::Error),
    #[error("Invalid stored account: {0}")]
    InvalidRecord(String),
    #[error("Database error")]
    Database(#[source] sqlx::Error),
    #[error("Unexpected error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return StoreError::NotUnique(e);
        }
        StoreError::Database(e)
    }
}
