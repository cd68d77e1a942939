use api::scheduler;
use jiff::civil::date;
use payloads::{
    AccountStatus, PayableDetails, ReceivableDetails, RecurrenceKind,
    responses::SweepReport,
};
use rust_decimal::dec;
use test_helpers::{account_details, spawn_app};

#[tokio::test]
async fn interest_accrues_as_days_pass() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let account = app
        .create_payable(&account_details(dec!(1000), date(2025, 1, 10)))
        .await?;

    scheduler::schedule_tick(&app.stores, &app.time_source).await?;
    assert_eq!(
        app.get_payable(&account).await?.status,
        AccountStatus::Pending
    );

    // 20 days late
    app.advance_days(29);
    scheduler::schedule_tick(&app.stores, &app.time_source).await?;
    let overdue = app.get_payable(&account).await?;
    assert_eq!(overdue.status, AccountStatus::Overdue);
    assert_eq!(overdue.interest, dec!(0.22));

    // same day, nothing changes
    let summary =
        scheduler::refresh_statuses(&app.stores, &app.time_source).await?;
    assert_eq!(summary.payables.updated, 0);
    assert_eq!(app.get_payable(&account).await?, overdue);

    app.advance_days(10);
    scheduler::schedule_tick(&app.stores, &app.time_source).await?;
    let later = app.get_payable(&account).await?;
    assert_eq!(later.interest, dec!(0.33));
    assert_eq!(later.remaining, dec!(1000.33));
    Ok(())
}

#[tokio::test]
async fn partially_settled_accounts_still_go_overdue() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let account = app
        .create_payable(&account_details(dec!(500), date(2025, 1, 5)))
        .await?;
    let account = app.settle_payable(&account, dec!(200)).await?;
    assert_eq!(account.status, AccountStatus::PartiallySettled);

    app.advance_days(10);
    scheduler::schedule_tick(&app.stores, &app.time_source).await?;
    let account = app.get_payable(&account).await?;
    assert_eq!(account.status, AccountStatus::Overdue);
    // interest is charged on the original amount
    assert_eq!(account.interest, dec!(0.033));
    assert_eq!(account.remaining, dec!(300.033));
    Ok(())
}

#[tokio::test]
async fn failed_refreshes_are_counted_and_skipped() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let broken = app
        .create_payable(&account_details(dec!(10), date(2025, 1, 2)))
        .await?;
    let fine = app
        .create_payable(&account_details(dec!(10), date(2025, 1, 2)))
        .await?;
    app.store.fail_writes_for(broken.id)?;

    app.advance_days(5);
    let summary = app.client.refresh_statuses().await?;
    assert_eq!(
        summary.payables,
        SweepReport {
            examined: 2,
            updated: 1,
            failed: 1,
        }
    );
    assert_eq!(summary.receivables, SweepReport::default());

    assert_eq!(app.get_payable(&fine).await?.status, AccountStatus::Overdue);
    assert_eq!(app.get_payable(&broken).await?.status, AccountStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn recurring_receivables_roll_over_once() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let mut details =
        account_details::<ReceivableDetails>(dec!(99.90), date(2025, 1, 15));
    details.recurring = true;
    details.recurrence_kind = Some(RecurrenceKind::Biweekly);
    let account = app.create_receivable(&details).await?;
    app.client
        .settle_account::<ReceivableDetails>(
            payloads::AccountKind::Receivable,
            &test_helpers::settlement(account.id, dec!(99.90)),
        )
        .await?;

    for _ in 0..3 {
        scheduler::schedule_tick(&app.stores, &app.time_source).await?;
    }

    let all = app
        .client
        .list_accounts::<ReceivableDetails>(
            payloads::AccountKind::Receivable,
            &Default::default(),
        )
        .await?;
    assert_eq!(all.len(), 2);
    let next = &all[1];
    assert_eq!(next.predecessor_id, Some(account.id));
    assert_eq!(next.number.to_string(), "CR-002");
    assert_eq!(next.due_date, date(2025, 1, 30));
    assert_eq!(next.amount, dec!(99.90));
    assert_eq!(next.settled_amount, dec!(0));
    Ok(())
}

#[tokio::test]
async fn failed_rollovers_do_not_block_others() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let mut details =
        account_details::<PayableDetails>(dec!(50), date(2025, 1, 20));
    details.recurring = true;
    details.recurrence_kind = Some(RecurrenceKind::Yearly);
    let broken = app.create_payable(&details).await?;
    let fine = app.create_payable(&details).await?;
    app.settle_payable(&broken, dec!(50)).await?;
    app.settle_payable(&fine, dec!(50)).await?;
    app.store.fail_writes_for(broken.id)?;

    let summary = app.client.process_recurring().await?;
    assert_eq!(summary.payables.examined, 2);
    assert_eq!(summary.payables.updated, 1);
    assert_eq!(summary.payables.failed, 1);

    let all = app.list_payables().await?;
    let successors: Vec<_> =
        all.iter().filter_map(|a| a.predecessor_id).collect();
    assert_eq!(successors, vec![fine.id]);
    let next = all.iter().find(|a| a.predecessor_id.is_some()).unwrap();
    assert_eq!(next.due_date, date(2026, 1, 20));
    Ok(())
}
