pub mod accounts;

use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, web,
};

use crate::account::{Payable, Receivable};
use crate::service::{ErrorKind, ServiceError};
use crate::store::StoreError;

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(accounts::account_services::<Payable>())
        .service(accounts::account_services::<Receivable>())
        .service(accounts::refresh_statuses)
        .service(accounts::process_recurring)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("Bad request")]
    BadRequest(#[source] anyhow::Error),
    #[error("Not found")]
    NotFound(#[source] anyhow::Error),
    #[error("Conflict")]
    Conflict(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::BadRequest(e) => {
                HttpResponse::BadRequest().body(format!("{self}: {e}"))
            }
            Self::NotFound(e) => {
                HttpResponse::NotFound().body(format!("{self}: {e}"))
            }
            Self::Conflict(e) => {
                HttpResponse::Conflict().body(format!("{self}: {e}"))
            }
            Self::UnexpectedError(_) => {
                HttpResponse::InternalServerError().body(self.to_string())
            }
        }
    }
}

impl From<ServiceError> for APIError {
    fn from(e: ServiceError) -> Self {
        match e.kind() {
            ErrorKind::Validation | ErrorKind::InvalidStateTransition => {
                APIError::BadRequest(e.into())
            }
            ErrorKind::NotFound => APIError::NotFound(e.into()),
            ErrorKind::Conflict => APIError::Conflict(e.into()),
            ErrorKind::Persistence => APIError::UnexpectedError(e.into()),
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        ServiceError::from(e).into()
    }
}
