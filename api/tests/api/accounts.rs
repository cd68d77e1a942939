use jiff::civil::date;
use payloads::{
    AccountId, AccountKind, AccountStatus, PayableDetails, PaymentMethod,
    ReceivableDetails, RecurrenceKind, SalespersonId, requests,
};
use reqwest::StatusCode;
use rust_decimal::dec;
use test_helpers::{
    account_details, assert_status_code, settlement, spawn_app,
};
use uuid::Uuid;

#[tokio::test]
async fn receivables_are_numbered_in_sequence() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let details = account_details::<ReceivableDetails>(dec!(250), app.today());

    let first = app.create_receivable(&details).await?;
    let second = app.create_receivable(&details).await?;
    let payable = app
        .create_payable(&account_details(dec!(10), app.today()))
        .await?;

    assert_eq!(first.number.to_string(), "CR-001");
    assert_eq!(second.number.to_string(), "CR-002");
    assert_eq!(payable.number.to_string(), "CP-001");
    assert_eq!(first.status, AccountStatus::Pending);
    assert_eq!(first.issue_date, date(2025, 1, 1));
    assert_eq!(first.remaining, dec!(250));
    Ok(())
}

#[tokio::test]
async fn counterparty_names_are_copied_onto_accounts() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let supplier = app.add_supplier("Distribuidora Norte")?;
    let client = app.add_client("Mercado Bom Preço")?;

    let mut details = account_details::<PayableDetails>(dec!(90), app.today());
    details.counterparty_id = Some(supplier);
    details.details.category = Some("supplies".into());
    let payable = app.create_payable(&details).await?;
    assert_eq!(
        payable.counterparty_name.as_deref(),
        Some("Distribuidora Norte")
    );
    assert_eq!(payable.details.category.as_deref(), Some("supplies"));

    // a client id doesn't resolve as a supplier
    details.counterparty_id = Some(client);
    let result = app
        .client
        .create_account(AccountKind::Payable, &details)
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    let salesperson = SalespersonId(Uuid::new_v4());
    let mut details =
        account_details::<ReceivableDetails>(dec!(90), app.today());
    details.counterparty_id = Some(client);
    details.details.salesperson_id = Some(salesperson);
    let receivable = app.create_receivable(&details).await?;
    assert_eq!(
        receivable.counterparty_name.as_deref(),
        Some("Mercado Bom Preço")
    );
    assert_eq!(receivable.details.salesperson_id, Some(salesperson));
    Ok(())
}

#[tokio::test]
async fn invalid_accounts_are_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let details = account_details::<PayableDetails>(dec!(0), app.today());
    let result = app
        .client
        .create_account(AccountKind::Payable, &details)
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    let mut details = account_details::<PayableDetails>(dec!(10), app.today());
    details.description = "   ".into();
    let result = app
        .client
        .create_account(AccountKind::Payable, &details)
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    // due before issue
    let details =
        account_details::<PayableDetails>(dec!(10), date(2024, 12, 31));
    let result = app
        .client
        .create_account(AccountKind::Payable, &details)
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    let mut details = account_details::<PayableDetails>(dec!(10), app.today());
    details.recurring = true;
    let result = app
        .client
        .create_account(AccountKind::Payable, &details)
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    assert!(app.list_payables().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn overdue_account_settles_to_zero() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let mut details =
        account_details::<PayableDetails>(dec!(1000.00), date(2024, 12, 31));
    details.issue_date = Some(date(2024, 12, 1));
    let account = app.create_payable(&details).await?;
    assert_eq!(account.status, AccountStatus::Pending);

    let summary = app.client.refresh_statuses().await?;
    assert_eq!(summary.payables.updated, 1);

    let account = app.get_payable(&account).await?;
    assert_eq!(account.status, AccountStatus::Overdue);
    assert!(account.interest > dec!(0));
    assert_eq!(account.remaining, dec!(1000.00) + account.interest);

    let settled = app.settle_payable(&account, account.remaining).await?;
    assert_eq!(settled.status, AccountStatus::Settled);
    assert_eq!(settled.remaining, dec!(0));
    assert_eq!(settled.settlement_method, Some(PaymentMethod::Pix));
    assert_eq!(settled.settled_on, Some(date(2025, 1, 1)));
    Ok(())
}

#[tokio::test]
async fn partial_settlements_accumulate() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let account = app
        .create_payable(&account_details(dec!(300), app.today()))
        .await?;

    let account = app.settle_payable(&account, dec!(100)).await?;
    assert_eq!(account.status, AccountStatus::PartiallySettled);
    assert_eq!(account.remaining, dec!(200));

    let result = app
        .client
        .settle_account::<PayableDetails>(
            AccountKind::Payable,
            &settlement(account.id, dec!(250)),
        )
        .await;
    match result {
        Err(payloads::ClientError::APIError(code, body)) => {
            assert_eq!(code, StatusCode::BAD_REQUEST);
            assert!(
                body.contains("exceeds remaining balance of 200"),
                "{body}"
            );
        }
        other => panic!("expected overpayment error, got {other:?}"),
    }

    // rejected settlement left the account as it was
    let unchanged = app.get_payable(&account).await?;
    assert_eq!(unchanged, account);

    let account = app.settle_payable(&account, dec!(200)).await?;
    assert_eq!(account.status, AccountStatus::Settled);
    assert_eq!(account.settled_amount, dec!(300));
    Ok(())
}

#[tokio::test]
async fn cancelled_accounts_cannot_be_settled() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let account = app
        .create_receivable(&account_details(dec!(40), app.today()))
        .await?;

    let cancelled = app
        .client
        .cancel_account::<ReceivableDetails>(AccountKind::Receivable, &account.id)
        .await?;
    assert_eq!(cancelled.status, AccountStatus::Cancelled);

    let result = app
        .client
        .settle_account::<ReceivableDetails>(
            AccountKind::Receivable,
            &settlement(account.id, dec!(40)),
        )
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    let stored = app
        .client
        .get_account::<ReceivableDetails>(AccountKind::Receivable, &account.id)
        .await?;
    assert_eq!(stored, cancelled);
    Ok(())
}

#[tokio::test]
async fn settled_accounts_cannot_be_cancelled() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let account = app
        .create_payable(&account_details(dec!(75), app.today()))
        .await?;
    app.settle_payable(&account, dec!(75)).await?;

    let result = app
        .client
        .cancel_account::<PayableDetails>(AccountKind::Payable, &account.id)
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn accounts_are_scoped_to_their_direction() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let payable = app
        .create_payable(&account_details(dec!(75), app.today()))
        .await?;

    let result = app
        .client
        .get_account::<ReceivableDetails>(AccountKind::Receivable, &payable.id)
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    let result = app
        .client
        .get_account::<PayableDetails>(
            AccountKind::Payable,
            &AccountId(Uuid::new_v4()),
        )
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleted_accounts_disappear() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let keep = app
        .create_payable(&account_details(dec!(1), app.today()))
        .await?;
    let delete = app
        .create_payable(&account_details(dec!(2), app.today()))
        .await?;

    app.client
        .delete_account(AccountKind::Payable, &delete.id)
        .await?;

    let remaining = app.list_payables().await?;
    assert_eq!(remaining, vec![keep]);

    let result = app
        .client
        .get_account::<PayableDetails>(AccountKind::Payable, &delete.id)
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    let result = app
        .client
        .delete_account(AccountKind::Payable, &delete.id)
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_filters_by_status() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let later = app
        .create_payable(&account_details(dec!(10), date(2025, 3, 1)))
        .await?;
    let sooner = app
        .create_payable(&account_details(dec!(20), date(2025, 2, 1)))
        .await?;
    let settled = app
        .create_payable(&account_details(dec!(30), date(2025, 1, 15)))
        .await?;
    let settled = app.settle_payable(&settled, dec!(30)).await?;

    let all = app.list_payables().await?;
    let numbers: Vec<_> = all.iter().map(|a| a.number).collect();
    assert_eq!(numbers, vec![settled.number, sooner.number, later.number]);

    let pending = app
        .client
        .list_accounts::<PayableDetails>(
            AccountKind::Payable,
            &requests::ListAccounts {
                status: Some(AccountStatus::Pending),
            },
        )
        .await?;
    assert_eq!(pending, vec![sooner, later]);
    Ok(())
}

#[tokio::test]
async fn recurring_payable_rolls_over_after_settlement() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let mut details =
        account_details::<PayableDetails>(dec!(1200), date(2025, 1, 31));
    details.recurring = true;
    details.recurrence_kind = Some(RecurrenceKind::Monthly);
    details.details.cost_center = Some("HQ".into());
    let account = app.create_payable(&details).await?;

    // nothing to do until it's settled
    let summary = app.client.process_recurring().await?;
    assert_eq!(summary.payables.updated, 0);

    app.settle_payable(&account, dec!(1200)).await?;
    let summary = app.client.process_recurring().await?;
    assert_eq!(summary.payables.updated, 1);
    let summary = app.client.process_recurring().await?;
    assert_eq!(summary.payables.updated, 0);

    let all = app.list_payables().await?;
    assert_eq!(all.len(), 2);
    let next = &all[1];
    assert_eq!(next.predecessor_id, Some(account.id));
    assert_eq!(next.number.to_string(), "CP-002");
    assert_eq!(next.issue_date, date(2025, 1, 31));
    assert_eq!(next.due_date, date(2025, 2, 28));
    assert_eq!(next.status, AccountStatus::Pending);
    assert_eq!(next.details.cost_center.as_deref(), Some("HQ"));
    assert_eq!(all[0].status, AccountStatus::Settled);
    Ok(())
}
