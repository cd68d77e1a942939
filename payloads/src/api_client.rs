use crate::{AccountId, AccountKind, requests, responses};
use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the backend.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client
            .post(self.format_url(path))
            .json(body)
            .send()
            .await
    }

    async fn empty_post(&self, path: &str) -> ReqwestResult {
        self.inner_client.post(self.format_url(path)).send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Route name for an operation on one kind of account, e.g.
/// `settle_payable` or `list_receivables`.
fn account_path(operation: &str, kind: AccountKind) -> String {
    format!("{operation}_{}", kind.as_str())
}

/// Methods on the backend API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    pub async fn create_account<T: Serialize + DeserializeOwned>(
        &self,
        kind: AccountKind,
        details: &requests::CreateAccount<T>,
    ) -> Result<responses::Account<T>, ClientError> {
        let response =
            self.post(&account_path("create", kind), details).await?;
        ok_body(response).await
    }

    pub async fn get_account<T: DeserializeOwned>(
        &self,
        kind: AccountKind,
        account_id: &AccountId,
    ) -> Result<responses::Account<T>, ClientError> {
        let response = self.post(&account_path("get", kind), account_id).await?;
        ok_body(response).await
    }

    pub async fn list_accounts<T: DeserializeOwned>(
        &self,
        kind: AccountKind,
        details: &requests::ListAccounts,
    ) -> Result<Vec<responses::Account<T>>, ClientError> {
        let path = format!("{}s", account_path("list", kind));
        let response = self.post(&path, details).await?;
        ok_body(response).await
    }

    pub async fn settle_account<T: DeserializeOwned>(
        &self,
        kind: AccountKind,
        details: &requests::SettleAccount,
    ) -> Result<responses::Account<T>, ClientError> {
        let response =
            self.post(&account_path("settle", kind), details).await?;
        ok_body(response).await
    }

    pub async fn cancel_account<T: DeserializeOwned>(
        &self,
        kind: AccountKind,
        account_id: &AccountId,
    ) -> Result<responses::Account<T>, ClientError> {
        let response =
            self.post(&account_path("cancel", kind), account_id).await?;
        ok_body(response).await
    }

    pub async fn delete_account(
        &self,
        kind: AccountKind,
        account_id: &AccountId,
    ) -> Result<(), ClientError> {
        let response =
            self.post(&account_path("delete", kind), account_id).await?;
        ok_empty(response).await
    }

    /// Run the overdue sweep over both kinds of account now.
    pub async fn refresh_statuses(
        &self,
    ) -> Result<responses::SweepSummary, ClientError> {
        let response = self.empty_post("refresh_statuses").await?;
        ok_body(response).await
    }

    /// Generate successors for settled recurring accounts now.
    pub async fn process_recurring(
        &self,
    ) -> Result<responses::SweepSummary, ClientError> {
        let response = self.empty_post("process_recurring").await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
