//! TripBuddy server entry point.
//!
//! Boots the HTTP API with the category result cache, the trip document store
//! and the fare providers. Logs are JSON on stderr.

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tripbuddy_core::{AppConfig, StoreDb};

mod error;
mod fares;
mod limiter;
mod routes;
mod state;
mod sweeper;
mod trips;

use state::AppState;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let db = StoreDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;

    let state = AppState::from_config(&config, db);
    let sweeper = sweeper::spawn(state.cache.clone(), config.cache_sweep_interval());

    tracing::info!(bind_addr = %config.bind_addr, "starting TripBuddy server");

    let data = web::Data::new(state);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes::configure))
        .bind(&config.bind_addr)
        .with_context(|| format!("binding {}", config.bind_addr))?
        .run()
        .await?;

    sweeper.abort();
    tracing::info!("server stopped");
    Ok(())
}
