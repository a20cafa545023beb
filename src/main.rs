//! Leave engine server.
//!
//! Loads configuration from `LEAVE_ENGINE_CONFIG` (default
//! `./config/default`), seeds an in-memory directory and ledger, and serves
//! the HTTP API. Notifications are written to the log.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use leave_engine::api::{AppState, create_router};
use leave_engine::config::{ConfigLoader, SeedConfig};
use leave_engine::directory::InMemoryDirectory;
use leave_engine::engine::LeaveEngine;
use leave_engine::error::EngineResult;
use leave_engine::notify::LogNotifier;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

fn seed(engine: &LeaveEngine, directory: &InMemoryDirectory, seed: &SeedConfig) -> EngineResult<()> {
    for employee in &seed.employees {
        directory.insert(employee.to_employee())?;
    }
    for period in &seed.periods {
        engine.provision_period(
            period.employee_id,
            period.start_date,
            period.end_date,
            period.earned,
        )?;
    }
    info!(
        employees = seed.employees.len(),
        periods = seed.periods.len(),
        "Seed data loaded"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir =
        std::env::var("LEAVE_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let (config, seed_data) = match ConfigLoader::load(&config_dir) {
        Ok(loader) => loader.into_parts(),
        Err(err) => {
            error!(config_dir = %config_dir, error = %err, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    let addr = config.server.addr.clone();

    let directory = Arc::new(InMemoryDirectory::new());
    let engine = LeaveEngine::new(config, directory.clone(), Arc::new(LogNotifier));
    if let Err(err) = seed(&engine, &directory, &seed_data) {
        error!(error = %err, "Failed to seed directory and ledger");
        std::process::exit(1);
    }

    let engine = Arc::new(engine);
    let purger = Arc::clone(&engine);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(err) = purger.purge_expired_tokens(Utc::now()) {
                warn!(error = %err, "Token purge failed");
            }
        }
    });

    let app = create_router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    info!("leave-engine listening on {addr}");
    axum::serve(listener, app).await.expect("server error");
}
