//! Postgres-backed account store.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use payloads::{
    AccountId, AccountKind, AccountNumber, AccountStatus, CounterpartyId,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    AccountRow, AccountStore, CounterpartyDirectory, StoreError,
};
use crate::account::{Account, Direction};

const NUMBER_UNIQUE: &str = "accounts_kind_number_unique";
const PREDECESSOR_UNIQUE: &str = "accounts_predecessor_unique";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_accounts<D: Direction>(
        &self,
        filter: &str,
        status: Option<AccountStatus>,
    ) -> Result<Vec<Account<D>>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT * FROM accounts WHERE NOT is_deleted AND kind = ",
        );
        query.push_bind(D::KIND);
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(filter).push(" ORDER BY due_date, number");

        query
            .build_query_as::<AccountRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }
}

/// Turn unique violations on the account indexes into specific errors.
fn map_insert_error<D: Direction>(
    e: sqlx::Error,
    account: &Account<D>,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        match db_err.constraint() {
            Some(NUMBER_UNIQUE) => {
                return StoreError::DuplicateNumber(account.number);
            }
            Some(PREDECESSOR_UNIQUE) => {
                if let Some(predecessor) = account.predecessor_id {
                    return StoreError::SuccessorAlreadyExists(predecessor);
                }
            }
            _ => {}
        }
    }
    e.into()
}

#[async_trait]
impl<D: Direction> AccountStore<D> for PgStore {
    #[tracing::instrument(skip(self))]
    async fn read_account(
        &self,
        id: &AccountId,
    ) -> Result<Account<D>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts
            WHERE id = $1 AND kind = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(D::KIND)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => StoreError::AccountNotFound,
            e => StoreError::Database(e),
        })?;
        row.try_into()
    }

    async fn list_accounts(&self) -> Result<Vec<Account<D>>, StoreError> {
        self.fetch_accounts("", None).await
    }

    async fn list_accounts_by_status(
        &self,
        status: AccountStatus,
    ) -> Result<Vec<Account<D>>, StoreError> {
        self.fetch_accounts("", Some(status)).await
    }

    async fn list_open_accounts(&self) -> Result<Vec<Account<D>>, StoreError> {
        self.fetch_accounts(
            " AND status NOT IN ('settled', 'cancelled')",
            None,
        )
        .await
    }

    async fn list_recurring_settled_accounts(
        &self,
    ) -> Result<Vec<Account<D>>, StoreError> {
        self.fetch_accounts(
            " AND recurring AND NOT EXISTS (
                SELECT 1 FROM accounts successor
                WHERE successor.predecessor_id = accounts.id
            )",
            Some(AccountStatus::Settled),
        )
        .await
    }

    /// The counter row is locked for the duration of the update, so
    /// concurrent callers are serialized. It never falls behind numbers
    /// already present in the table.
    async fn next_number(&self) -> Result<AccountNumber, StoreError> {
        let seq = sqlx::query_scalar::<_, i32>(
            "UPDATE account_sequences
            SET last_value = GREATEST(
                last_value,
                (SELECT COALESCE(MAX(number), 0) FROM accounts WHERE kind = $1)
            ) + 1
            WHERE kind = $1
            RETURNING last_value",
        )
        .bind(D::KIND)
        .fetch_one(&self.pool)
        .await?;
        Ok(AccountNumber::new(D::KIND, seq))
    }

    #[tracing::instrument(skip(self, account), fields(number = %account.number))]
    async fn insert_account(
        &self,
        account: &Account<D>,
    ) -> Result<(), StoreError> {
        let row = account.to_row()?;
        sqlx::query(
            "INSERT INTO accounts (
                id,
                kind,
                number,
                description,
                counterparty_id,
                counterparty_name,
                source_document_id,
                invoice_number,
                amount,
                discount,
                interest,
                penalty,
                settled_amount,
                issue_date,
                due_date,
                settled_on,
                settlement_method,
                status,
                recurring,
                recurrence_kind,
                predecessor_id,
                notes,
                details,
                is_deleted,
                version,
                created_at,
                updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27
            )",
        )
        .bind(row.id)
        .bind(row.kind)
        .bind(row.number)
        .bind(&row.description)
        .bind(row.counterparty_id)
        .bind(&row.counterparty_name)
        .bind(row.source_document_id)
        .bind(&row.invoice_number)
        .bind(row.amount)
        .bind(row.discount)
        .bind(row.interest)
        .bind(row.penalty)
        .bind(row.settled_amount)
        .bind(row.issue_date.to_sqlx())
        .bind(row.due_date.to_sqlx())
        .bind(row.settled_on.map(|d| d.to_sqlx()))
        .bind(row.settlement_method)
        .bind(row.status)
        .bind(row.recurring)
        .bind(&row.recurrence_kind)
        .bind(row.predecessor_id)
        .bind(&row.notes)
        .bind(&row.details)
        .bind(row.is_deleted)
        .bind(row.version)
        .bind(row.created_at.to_sqlx())
        .bind(row.updated_at.to_sqlx())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, account))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, account), fields(number = %account.number))]
    async fn replace_account(
        &self,
        account: &Account<D>,
    ) -> Result<Account<D>, StoreError> {
        let row = account.to_row()?;
        let updated = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts SET
                description = $4,
                counterparty_id = $5,
                counterparty_name = $6,
                source_document_id = $7,
                invoice_number = $8,
                amount = $9,
                discount = $10,
                interest = $11,
                penalty = $12,
                settled_amount = $13,
                issue_date = $14,
                due_date = $15,
                settled_on = $16,
                settlement_method = $17,
                status = $18,
                recurring = $19,
                recurrence_kind = $20,
                notes = $21,
                details = $22,
                updated_at = $23,
                version = version + 1
            WHERE id = $1 AND kind = $2 AND version = $3 AND NOT is_deleted
            RETURNING *",
        )
        .bind(row.id)
        .bind(row.kind)
        .bind(row.version)
        .bind(&row.description)
        .bind(row.counterparty_id)
        .bind(&row.counterparty_name)
        .bind(row.source_document_id)
        .bind(&row.invoice_number)
        .bind(row.amount)
        .bind(row.discount)
        .bind(row.interest)
        .bind(row.penalty)
        .bind(row.settled_amount)
        .bind(row.issue_date.to_sqlx())
        .bind(row.due_date.to_sqlx())
        .bind(row.settled_on.map(|d| d.to_sqlx()))
        .bind(row.settlement_method)
        .bind(row.status)
        .bind(row.recurring)
        .bind(&row.recurrence_kind)
        .bind(&row.notes)
        .bind(&row.details)
        .bind(row.updated_at.to_sqlx())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                // Either gone or someone else got there first.
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(
                        SELECT 1 FROM accounts
                        WHERE id = $1 AND kind = $2 AND NOT is_deleted
                    )",
                )
                .bind(account.id)
                .bind(D::KIND)
                .fetch_one(&self.pool)
                .await?;
                if exists {
                    Err(StoreError::VersionConflict(account.number))
                } else {
                    Err(StoreError::AccountNotFound)
                }
            }
        }
    }

    async fn soft_delete_account(
        &self,
        id: &AccountId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
            SET is_deleted = true, updated_at = $3, version = version + 1
            WHERE id = $1 AND kind = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(D::KIND)
        .bind(now.to_sqlx())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::AccountNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CounterpartyDirectory for PgStore {
    async fn counterparty_name(
        &self,
        kind: AccountKind,
        id: &CounterpartyId,
    ) -> Result<Option<String>, StoreError> {
        let query = match kind {
            AccountKind::Payable => {
                "SELECT name FROM suppliers WHERE id = $1 AND NOT is_deleted"
            }
            AccountKind::Receivable => {
                "SELECT name FROM clients WHERE id = $1 AND NOT is_deleted"
            }
        };
        Ok(sqlx::query_scalar::<_, String>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
