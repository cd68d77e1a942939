//! Account routes. The same handlers serve payables and receivables;
//! [`account_services`] mounts one set per [`Direction`] under
//! `/<operation>_payable` or `/<operation>_receivable`.

use actix_web::{HttpResponse, Resource, dev::HttpServiceFactory, post, web};
use payloads::{AccountId, requests};

use crate::account::Direction;
use crate::scheduler;
use crate::service;
use crate::store::{AccountStore, CounterpartyDirectory, Stores};
use crate::time::TimeSource;

use super::APIError;

type Store<D> = web::Data<dyn AccountStore<D>>;

pub fn account_services<D: Direction>() -> impl HttpServiceFactory {
    let kind = D::KIND.as_str();
    let route = |operation: &str| -> Resource {
        web::resource(format!("/{operation}_{kind}"))
    };
    (
        route("create").route(web::post().to(create_account::<D>)),
        route("get").route(web::post().to(get_account::<D>)),
        web::resource(format!("/list_{kind}s"))
            .route(web::post().to(list_accounts::<D>)),
        route("settle").route(web::post().to(settle_account::<D>)),
        route("cancel").route(web::post().to(cancel_account::<D>)),
        route("delete").route(web::post().to(delete_account::<D>)),
    )
}

#[tracing::instrument(skip(store, directory, time_source), fields(kind = %D::KIND), ret)]
async fn create_account<D: Direction>(
    details: web::Json<requests::CreateAccount<D::Details>>,
    store: Store<D>,
    directory: web::Data<dyn CounterpartyDirectory>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let account = service::create_account::<D>(
        &details,
        store.get_ref(),
        directory.get_ref(),
        &time_source,
    )
    .await?;
    Ok(HttpResponse::Ok().json(account.into_response()))
}

#[tracing::instrument(skip(store), fields(kind = %D::KIND), ret)]
async fn get_account<D: Direction>(
    account_id: web::Json<AccountId>,
    store: Store<D>,
) -> Result<HttpResponse, APIError> {
    let account = service::get_account(&account_id, store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(account.into_response()))
}

#[tracing::instrument(skip(store), fields(kind = %D::KIND))]
async fn list_accounts<D: Direction>(
    details: web::Json<requests::ListAccounts>,
    store: Store<D>,
) -> Result<HttpResponse, APIError> {
    let accounts =
        service::list_accounts(details.status, store.get_ref()).await?;
    let accounts = accounts
        .into_iter()
        .map(|a| a.into_response())
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(accounts))
}

#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND), ret)]
async fn settle_account<D: Direction>(
    details: web::Json<requests::SettleAccount>,
    store: Store<D>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let account =
        service::settle_account(&details, store.get_ref(), &time_source)
            .await?;
    Ok(HttpResponse::Ok().json(account.into_response()))
}

#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND), ret)]
async fn cancel_account<D: Direction>(
    account_id: web::Json<AccountId>,
    store: Store<D>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let account =
        service::cancel_account(&account_id, store.get_ref(), &time_source)
            .await?;
    Ok(HttpResponse::Ok().json(account.into_response()))
}

#[tracing::instrument(skip(store, time_source), fields(kind = %D::KIND), ret)]
async fn delete_account<D: Direction>(
    account_id: web::Json<AccountId>,
    store: Store<D>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    service::delete_account(&account_id, store.get_ref(), &time_source).await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(stores, time_source), ret)]
#[post("/refresh_statuses")]
pub async fn refresh_statuses(
    stores: web::Data<Stores>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let summary = scheduler::refresh_statuses(&stores, &time_source).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[tracing::instrument(skip(stores, time_source), ret)]
#[post("/process_recurring")]
pub async fn process_recurring(
    stores: web::Data<Stores>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let summary = scheduler::process_recurring(&stores, &time_source).await?;
    Ok(HttpResponse::Ok().json(summary))
}
