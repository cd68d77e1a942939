use api::store::{MemoryStore, Stores};
use api::time::TimeSource;
use api::{Config, telemetry};
use jiff::civil::Date;
use payloads::{
    AccountKind, CounterpartyId, PayableDetails, PaymentMethod,
    ReceivableDetails, requests, responses,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use tracing_log::LogTracer;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

pub struct TestApp {
    #[allow(unused)]
    pub port: u16,
    pub client: payloads::APIClient,
    pub time_source: TimeSource,
    /// The store behind the running server, for seeding and fault injection.
    pub store: MemoryStore,
    pub stores: Stores,
}

impl TestApp {
    /// Register a supplier that payables can reference.
    pub fn add_supplier(&self, name: &str) -> anyhow::Result<CounterpartyId> {
        let id = CounterpartyId(Uuid::new_v4());
        self.store.add_counterparty(AccountKind::Payable, id, name)?;
        Ok(id)
    }

    /// Register a client that receivables can reference.
    pub fn add_client(&self, name: &str) -> anyhow::Result<CounterpartyId> {
        let id = CounterpartyId(Uuid::new_v4());
        self.store.add_counterparty(AccountKind::Receivable, id, name)?;
        Ok(id)
    }

    pub async fn create_payable(
        &self,
        details: &requests::CreateAccount<PayableDetails>,
    ) -> anyhow::Result<responses::PayableAccount> {
        Ok(self
            .client
            .create_account(AccountKind::Payable, details)
            .await?)
    }

    pub async fn create_receivable(
        &self,
        details: &requests::CreateAccount<ReceivableDetails>,
    ) -> anyhow::Result<responses::ReceivableAccount> {
        Ok(self
            .client
            .create_account(AccountKind::Receivable, details)
            .await?)
    }

    pub async fn settle_payable(
        &self,
        account: &responses::PayableAccount,
        amount: Decimal,
    ) -> anyhow::Result<responses::PayableAccount> {
        Ok(self
            .client
            .settle_account(
                AccountKind::Payable,
                &settlement(account.id, amount),
            )
            .await?)
    }

    pub async fn get_payable(
        &self,
        account: &responses::PayableAccount,
    ) -> anyhow::Result<responses::PayableAccount> {
        Ok(self
            .client
            .get_account(AccountKind::Payable, &account.id)
            .await?)
    }

    pub async fn list_payables(
        &self,
    ) -> anyhow::Result<Vec<responses::PayableAccount>> {
        Ok(self
            .client
            .list_accounts(AccountKind::Payable, &Default::default())
            .await?)
    }

    /// Move the clock forward by whole days.
    #[cfg(feature = "mock-time")]
    pub fn advance_days(&self, days: i64) {
        self.time_source
            .advance(jiff::Span::new().hours(days * 24));
    }

    pub fn today(&self) -> Date {
        self.time_source.today()
    }
}

/// A plain, non-recurring account for `amount` due on `due_date`.
pub fn account_details<T: Default>(
    amount: Decimal,
    due_date: Date,
) -> requests::CreateAccount<T> {
    requests::CreateAccount {
        description: "Monthly internet".into(),
        counterparty_id: None,
        source_document_id: None,
        invoice_number: Some("NF-2025-001".into()),
        amount,
        discount: Decimal::ZERO,
        penalty: Decimal::ZERO,
        issue_date: None,
        due_date,
        recurring: false,
        recurrence_kind: None,
        notes: None,
        details: T::default(),
    }
}

pub fn settlement(
    account_id: payloads::AccountId,
    amount: Decimal,
) -> requests::SettleAccount {
    requests::SettleAccount {
        account_id,
        amount,
        method: PaymentMethod::Pix,
        settled_on: None,
    }
}

pub async fn spawn_app_on_port(port: u16) -> TestApp {
    let subscriber = telemetry::get_subscriber("error".into());
    let _ = LogTracer::init();
    let _ = subscriber.try_init();

    #[cfg(any(feature = "mock-time", test))]
    let time_source = TimeSource::new("2025-01-01T00:00:00Z".parse().unwrap());

    #[cfg(not(any(feature = "mock-time", test)))]
    let time_source = TimeSource::new();

    let store = MemoryStore::new();
    let stores = Stores::memory(store.clone());
    let mut config = Config {
        database_url: String::new(),
        ip: "127.0.0.1".into(),
        port,
        allowed_origins: vec!["*".to_string()],
        sweep_interval: std::time::Duration::from_secs(3600),
    };

    let server =
        api::build(&mut config, stores.clone(), time_source.clone()).unwrap();
    tokio::spawn(server);

    TestApp {
        port: config.port,
        client: payloads::APIClient {
            address: format!("http://127.0.0.1:{}", config.port),
            inner_client: reqwest::Client::new(),
        },
        time_source,
        store,
        stores,
    }
}

/// Use OS-assigned port for parallel testing.
pub async fn spawn_app() -> TestApp {
    spawn_app_on_port(0).await
}

/// Assert that the result of an API action results in a specific status code.
pub fn assert_status_code<T>(
    result: Result<T, payloads::ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(payloads::ClientError::APIError(code, _)) => {
            assert_eq!(code, expected)
        }
        _ => panic!("Expected APIError"),
    };
}
