//! Use cases over accounts: load, apply a lifecycle operation, persist.
//!
//! Every operation here touches a single account. Writes go through the
//! store's versioned replace, so a concurrent writer surfaces as
//! [`ErrorKind::Conflict`] instead of a silently lost update. Nothing retries.

use payloads::{
    AccountId, AccountStatus, CounterpartyId, requests,
};
use uuid::Uuid;

use crate::account::{Account, AccountDraft, AccountError, Direction};
use crate::store::{AccountStore, CounterpartyDirectory, StoreError};
use crate::time::TimeSource;

/// How callers should treat a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// The account's lifecycle doesn't allow the operation.
    InvalidStateTransition,
    NotFound,
    /// Lost a race with another writer; reload and try again.
    Conflict,
    /// Storage failed.
    Persistence,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("No active {label} with id {id}")]
    CounterpartyNotFound {
        label: &'static str,
        id: CounterpartyId,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Account(e) if e.is_state_transition() => {
                ErrorKind::InvalidStateTransition
            }
            Self::Account(_) => ErrorKind::Validation,
            Self::CounterpartyNotFound { .. } => ErrorKind::NotFound,
            Self::Store(e) => match e {
                StoreError::AccountNotFound => ErrorKind::NotFound,
                StoreError::VersionConflict(_)
                | StoreError::DuplicateNumber(_)
                | StoreError::SuccessorAlreadyExists(_)
                | StoreError::NotUnique(_) => ErrorKind::Conflict,
                StoreError::InvalidRecord(_)
                | StoreError::Database(_)
                | StoreError::UnexpectedError(_) => ErrorKind::Persistence,
            },
        }
    }
}

/// Validate a creation request, denormalize the counterparty name, assign the
/// next number and store the new account.
#[tracing::instrument(skip(store, directory, time_source), fields(kind = %D::KIND))]
pub async fn create_account<D: Direction>(
    request: &requests::CreateAccount<D::Details>,
    store: &dyn AccountStore<D>,
    directory: &dyn CounterpartyDirectory,
    time_source: &TimeSource,
) -> Result<Account<D>, ServiceError> {
    let mut draft = AccountDraft::<D>::from_request(request, time_source.today());
    draft.validate()?;

    if let Some(counterparty_id) = draft.counterparty_id {
        let name = directory
            .counterparty_name(D::KIND, &counterparty_id)
            .await?
            .ok_or(ServiceError::CounterpartyNotFound {
                label: D::KIND.counterparty_label(),
                id: counterparty_id,
            })?;
        draft.counterparty_name = Some(name);
    }

    let number = store.next_number().await?;
    let account = Account::open(
        draft,
        AccountId(Uuid::new_v4()),
        number,
        time_source.now(),
    );
    store.insert_account(&account).await?;
    tracing::info!(number = %account.number, "created account");
    Ok(account)
}

pub async fn get_account<D: Direction>(
    id: &AccountId,
    store: &dyn AccountStore<D>,
) -> Result<Account<D>, ServiceError> {
    Ok(store.read_account(id).await?)
}

pub async fn list_accounts<D: Direction>(
    status: Option<AccountStatus>,
    store: &dyn AccountStore<D>,
) -> Result<Vec<Account<D>>, ServiceError> {
    let accounts = match status {
        Some(status) => store.list_accounts_by_status(status).await?,
        None => store.list_accounts().await?,
    };
    Ok(accounts)
}

/// Pay (payable) or receive (receivable) against an account.
#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND))]
pub async fn settle_account<D: Direction>(
    request: &requests::SettleAccount,
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<Account<D>, ServiceError> {
    let mut account = store.read_account(&request.account_id).await?;
    account.settle(
        request.amount,
        request.method,
        request.settled_on,
        time_source.now(),
    )?;
    let account = store.replace_account(&account).await?;
    tracing::info!(
        number = %account.number,
        status = %account.status,
        remaining = %account.remaining(),
        "settled account"
    );
    Ok(account)
}

#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND))]
pub async fn cancel_account<D: Direction>(
    id: &AccountId,
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<Account<D>, ServiceError> {
    let mut account = store.read_account(id).await?;
    account.cancel(time_source.now())?;
    let account = store.replace_account(&account).await?;
    tracing::info!(number = %account.number, "cancelled account");
    Ok(account)
}

/// Soft delete: the account stays stored but no longer resolves.
#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND))]
pub async fn delete_account<D: Direction>(
    id: &AccountId,
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<(), ServiceError> {
    store.soft_delete_account(id, time_source.now()).await?;
    Ok(())
}
