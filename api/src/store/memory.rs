//! Process-local account store.
//!
//! Holds the same rows the Postgres store does and enforces the same rules:
//! versioned replace, unique numbers per kind, one successor per predecessor.
//! Used by the test app and by tests that don't need a database.

use async_trait::async_trait;
use jiff::Timestamp;
use payloads::{
    AccountId, AccountKind, AccountNumber, AccountStatus, CounterpartyId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{AccountRow, AccountStore, CounterpartyDirectory, StoreError};
use crate::account::{Account, Direction};

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<AccountId, AccountRow>,
    sequences: HashMap<AccountKind, i32>,
    counterparties: HashMap<(AccountKind, CounterpartyId), String>,
    failing_writes: HashSet<AccountId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| {
            StoreError::UnexpectedError(anyhow::anyhow!(
                "memory store lock poisoned"
            ))
        })
    }

    /// Register a supplier (payable) or client (receivable) by name.
    pub fn add_counterparty(
        &self,
        kind: AccountKind,
        id: CounterpartyId,
        name: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.state()?.counterparties.insert((kind, id), name.into());
        Ok(())
    }

    /// Make every subsequent write touching `id` (as the account itself or
    /// as the predecessor of a new account) fail, to exercise error paths.
    pub fn fail_writes_for(&self, id: AccountId) -> Result<(), StoreError> {
        self.state()?.failing_writes.insert(id);
        Ok(())
    }

    fn collect<D: Direction>(
        &self,
        keep: impl Fn(&AccountRow, &MemoryState) -> bool,
    ) -> Result<Vec<Account<D>>, StoreError> {
        let guard = self.state()?;
        let state: &MemoryState = &guard;
        let mut rows: Vec<&AccountRow> = state
            .accounts
            .values()
            .filter(|row| {
                row.kind == D::KIND && !row.is_deleted && keep(row, state)
            })
            .collect();
        rows.sort_by_key(|row| (row.due_date, row.number));
        rows.into_iter().cloned().map(Account::try_from).collect()
    }
}

fn injected_failure(id: &AccountId) -> StoreError {
    StoreError::UnexpectedError(anyhow::anyhow!("injected write failure for {id}"))
}

#[async_trait]
impl<D: Direction> AccountStore<D> for MemoryStore {
    async fn read_account(
        &self,
        id: &AccountId,
    ) -> Result<Account<D>, StoreError> {
        let state = self.state()?;
        match state.accounts.get(id) {
            Some(row) if row.kind == D::KIND && !row.is_deleted => {
                row.clone().try_into()
            }
            _ => Err(StoreError::AccountNotFound),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account<D>>, StoreError> {
        self.collect(|_, _| true)
    }

    async fn list_accounts_by_status(
        &self,
        status: AccountStatus,
    ) -> Result<Vec<Account<D>>, StoreError> {
        self.collect(|row, _| row.status == status)
    }

    async fn list_open_accounts(&self) -> Result<Vec<Account<D>>, StoreError> {
        self.collect(|row, _| !row.status.is_terminal())
    }

    async fn list_recurring_settled_accounts(
        &self,
    ) -> Result<Vec<Account<D>>, StoreError> {
        self.collect(|row, state| {
            row.recurring
                && row.status == AccountStatus::Settled
                && !state
                    .accounts
                    .values()
                    .any(|other| other.predecessor_id == Some(row.id))
        })
    }

    async fn next_number(&self) -> Result<AccountNumber, StoreError> {
        let mut state = self.state()?;
        let highest = state
            .accounts
            .values()
            .filter(|row| row.kind == D::KIND)
            .map(|row| row.number)
            .max()
            .unwrap_or(0);
        let counter = state.sequences.entry(D::KIND).or_insert(0);
        *counter = (*counter).max(highest) + 1;
        Ok(AccountNumber::new(D::KIND, *counter))
    }

    async fn insert_account(
        &self,
        account: &Account<D>,
    ) -> Result<(), StoreError> {
        let row = account.to_row()?;
        let mut state = self.state()?;
        if state.failing_writes.contains(&row.id) {
            return Err(injected_failure(&row.id));
        }
        if let Some(predecessor) = row.predecessor_id {
            if state.failing_writes.contains(&predecessor) {
                return Err(injected_failure(&predecessor));
            }
            if state
                .accounts
                .values()
                .any(|other| other.predecessor_id == Some(predecessor))
            {
                return Err(StoreError::SuccessorAlreadyExists(predecessor));
            }
        }
        if state
            .accounts
            .values()
            .any(|other| other.kind == row.kind && other.number == row.number)
        {
            return Err(StoreError::DuplicateNumber(account.number));
        }
        if state.accounts.contains_key(&row.id) {
            return Err(StoreError::UnexpectedError(anyhow::anyhow!(
                "duplicate account id {}",
                row.id
            )));
        }
        state.accounts.insert(row.id, row);
        Ok(())
    }

    async fn replace_account(
        &self,
        account: &Account<D>,
    ) -> Result<Account<D>, StoreError> {
        let mut row = account.to_row()?;
        let mut state = self.state()?;
        if state.failing_writes.contains(&row.id) {
            return Err(injected_failure(&row.id));
        }
        let stored = match state.accounts.get_mut(&row.id) {
            Some(stored) if stored.kind == D::KIND && !stored.is_deleted => {
                stored
            }
            _ => return Err(StoreError::AccountNotFound),
        };
        if stored.version != row.version {
            return Err(StoreError::VersionConflict(account.number));
        }
        // identity and lineage are fixed at insert
        row.number = stored.number;
        row.predecessor_id = stored.predecessor_id;
        row.created_at = stored.created_at;
        row.is_deleted = false;
        row.version = stored.version + 1;
        *stored = row.clone();
        row.try_into()
    }

    async fn soft_delete_account(
        &self,
        id: &AccountId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.accounts.get_mut(id) {
            Some(row) if row.kind == D::KIND && !row.is_deleted => {
                row.is_deleted = true;
                row.updated_at = now;
                row.version += 1;
                Ok(())
            }
            _ => Err(StoreError::AccountNotFound),
        }
    }
}

#[async_trait]
impl CounterpartyDirectory for MemoryStore {
    async fn counterparty_name(
        &self,
        kind: AccountKind,
        id: &CounterpartyId,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.state()?.counterparties.get(&(kind, *id)).cloned())
    }
}
