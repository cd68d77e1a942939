pub mod account;
pub mod routes;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod time;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use std::net::TcpListener;
use std::time::Duration;

use crate::account::{Payable, Receivable};
use crate::store::{AccountStore, CounterpartyDirectory, Stores};
use crate::time::TimeSource;

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
pub fn build(
    config: &mut Config,
    stores: Stores,
    time_source: TimeSource,
) -> std::io::Result<Server> {
    let payables: web::Data<dyn AccountStore<Payable>> =
        web::Data::from(stores.payables.clone());
    let receivables: web::Data<dyn AccountStore<Receivable>> =
        web::Data::from(stores.receivables.clone());
    let counterparties: web::Data<dyn CounterpartyDirectory> =
        web::Data::from(stores.counterparties.clone());
    let stores = web::Data::new(stores);
    let time_source = web::Data::new(time_source);

    let allowed_origins = config.allowed_origins.clone();

    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        let cors = if allowed_origins.iter().any(|origin| origin == "*") {
            // development only
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            allowed_origins.iter().fold(
                Cors::default().allow_any_method().allow_any_header(),
                |cors, origin| cors.allowed_origin(origin),
            )
        };

        App::new()
            .wrap(cors)
            .service(routes::api_services())
            .app_data(payables.clone())
            .app_data(receivables.clone())
            .app_data(counterparties.clone())
            .app_data(stores.clone())
            .app_data(time_source.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

pub struct Config {
    pub database_url: String,
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
    /// List of allowed CORS origins. Use "*" to allow any origin (development only)
    pub allowed_origins: Vec<String>,
    /// How often the status and recurrence sweeps run.
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        use std::env::var;

        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let sweep_interval = match var("SWEEP_INTERVAL_SECS") {
            Ok(secs) => Duration::from_secs(
                secs.parse().context("parsing SWEEP_INTERVAL_SECS")?,
            ),
            Err(_) => Duration::from_secs(3600),
        };

        Ok(Config {
            database_url: var("DATABASE_URL").context("DATABASE_URL")?,
            ip: var("IP_ADDRESS").context("IP_ADDRESS")?,
            port: var("PORT")
                .context("PORT")?
                .parse()
                .context("parsing PORT")?,
            allowed_origins,
            sweep_interval,
        })
    }
}
