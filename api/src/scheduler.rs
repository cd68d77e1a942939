//! Periodic batch work over all accounts.
//!
//! Two sweeps, each run once per direction on every tick:
//!
//! ```text
//! refresh statuses    open accounts -> Pending | PartiallySettled | Overdue
//!                     (interest recomputed from today, written only if changed)
//!
//! process recurring   Settled + recurring, no successor yet
//!                       -> new Pending installment, one cadence later
//! ```
//!
//! A failure on one account is logged and counted and the sweep moves on to the
//! next. Only failing to load the batch itself aborts a sweep.

use anyhow::Context;
use payloads::{AccountId, responses::{SweepReport, SweepSummary}};
use std::time::Duration;
use tokio::time;
use uuid::Uuid;

use crate::account::{Account, Direction};
use crate::service::ServiceError;
use crate::store::{AccountStore, StoreError, Stores};
use crate::{telemetry::log_error, time::TimeSource};

pub struct Scheduler {
    stores: Stores,
    time_source: TimeSource,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new(
        stores: Stores,
        time_source: TimeSource,
        tick_interval: Duration,
    ) -> Self {
        Self {
            stores,
            time_source,
            tick_interval,
        }
    }

    pub async fn run(&self) {
        let mut interval = time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            let _ = schedule_tick(&self.stores, &self.time_source)
                .await
                .map_err(log_error);
        }
    }
}

/// Run every sweep once right now.
#[tracing::instrument(skip(stores, time_source))]
pub async fn schedule_tick(
    stores: &Stores,
    time_source: &TimeSource,
) -> anyhow::Result<()> {
    // Refresh first so that accounts settled since the last tick are seen
    // with their current status by the recurring sweep.
    let refreshed = refresh_statuses(stores, time_source)
        .await
        .context("refreshing account statuses")?;
    let recurring = process_recurring(stores, time_source)
        .await
        .context("processing recurring accounts")?;
    tracing::info!(?refreshed, ?recurring, "sweeps complete");
    Ok(())
}

/// [`refresh_all_statuses`] for payables and receivables.
pub async fn refresh_statuses(
    stores: &Stores,
    time_source: &TimeSource,
) -> Result<SweepSummary, StoreError> {
    Ok(SweepSummary {
        payables: refresh_all_statuses(stores.payables.as_ref(), time_source)
            .await?,
        receivables: refresh_all_statuses(
            stores.receivables.as_ref(),
            time_source,
        )
        .await?,
    })
}

/// [`process_recurring_accounts`] for payables and receivables.
pub async fn process_recurring(
    stores: &Stores,
    time_source: &TimeSource,
) -> Result<SweepSummary, StoreError> {
    Ok(SweepSummary {
        payables: process_recurring_accounts(
            stores.payables.as_ref(),
            time_source,
        )
        .await?,
        receivables: process_recurring_accounts(
            stores.receivables.as_ref(),
            time_source,
        )
        .await?,
    })
}

/// Re-derive status and interest for every open account as of today.
///
/// Idempotent within a day: interest depends only on the due date, the
/// original amount and today, so a second run finds nothing to write.
#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND))]
pub async fn refresh_all_statuses<D: Direction>(
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<SweepReport, StoreError> {
    let today = time_source.today();
    let now = time_source.now();
    let accounts = store.list_open_accounts().await?;

    let mut report = SweepReport {
        examined: accounts.len(),
        ..Default::default()
    };
    for mut account in accounts {
        if !account.refresh_status(today, now) {
            continue;
        }
        match store.replace_account(&account).await {
            Ok(stored) => {
                tracing::debug!(
                    number = %stored.number,
                    status = %stored.status,
                    interest = %stored.interest,
                    "refreshed account"
                );
                report.updated += 1;
            }
            Err(e) => {
                log_error(anyhow::Error::from(e).context(format!(
                    "failed to refresh account {}",
                    account.number
                )));
                report.failed += 1;
            }
        }
    }

    tracing::info!(?report, "refreshed statuses");
    Ok(report)
}

/// Create the next installment for every settled recurring account that
/// doesn't have one yet. Source accounts are left untouched.
#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND))]
pub async fn process_recurring_accounts<D: Direction>(
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<SweepReport, StoreError> {
    let accounts = store.list_recurring_settled_accounts().await?;

    let mut report = SweepReport {
        examined: accounts.len(),
        ..Default::default()
    };
    for account in &accounts {
        match create_successor(account, store, time_source).await {
            Ok(Some(successor)) => {
                tracing::info!(
                    source = %account.number,
                    successor = %successor.number,
                    due_date = %successor.due_date,
                    "created next installment"
                );
                report.updated += 1;
            }
            Ok(None) => {}
            // Another sweep got there first.
            Err(ServiceError::Store(StoreError::SuccessorAlreadyExists(_))) => {
                tracing::debug!(
                    source = %account.number,
                    "successor already exists"
                );
            }
            Err(e) => {
                log_error(anyhow::Error::from(e).context(format!(
                    "failed to create next installment of {}",
                    account.number
                )));
                report.failed += 1;
            }
        }
    }

    tracing::info!(?report, "processed recurring accounts");
    Ok(report)
}

async fn create_successor<D: Direction>(
    account: &Account<D>,
    store: &dyn AccountStore<D>,
    time_source: &TimeSource,
) -> Result<Option<Account<D>>, ServiceError> {
    let Some(draft) = account.generate_next_installment()? else {
        return Ok(None);
    };
    let number = store.next_number().await?;
    let successor = Account::open(
        draft,
        AccountId(Uuid::new_v4()),
        number,
        time_source.now(),
    );
    store.insert_account(&successor).await?;
    Ok(Some(successor))
}
