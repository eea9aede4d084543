//! Waggle simulation engine binary.
//!
//! Wires the scheduler, the `PostgreSQL` store, the content synthesizer,
//! and the trigger API into one long-running process:
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `waggle-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Assemble the scheduler and the tick driver
//! 5. Derive profiles for agents that lack one
//! 6. Spawn the trigger API server
//! 7. Spawn the recurring round timer
//! 8. Wait for Ctrl-C, then close the pool

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use waggle_api::{ApiState, ServerConfig, start_server};
use waggle_core::{ActionScheduler, TemplateSynthesizer, TickDriver, WaggleConfig};
use waggle_db::{PgStore, PostgresPool};

const CONFIG_PATH: &str = "waggle-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("starting waggle engine");

    // 2. Load configuration, falling back to defaults when the file is
    //    absent (env overrides still apply through from_file).
    let config_path = Path::new(CONFIG_PATH);
    let config = if config_path.exists() {
        WaggleConfig::from_file(config_path)
            .with_context(|| format!("failed to load {CONFIG_PATH}"))?
    } else {
        warn!(path = CONFIG_PATH, "config file not found, using defaults");
        let mut config = WaggleConfig::default();
        config.infrastructure.apply_env_overrides();
        config
    };
    info!(
        rounds_per_day = config.scheduler.rounds_per_day,
        tick_interval_secs = config.scheduler.tick_interval_secs,
        "configuration loaded"
    );

    // 3. Connect to PostgreSQL and bring the schema up to date.
    let pool = PostgresPool::connect_url(&config.infrastructure.postgres_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    pool.run_migrations()
        .await
        .context("failed to run database migrations")?;
    info!("database ready");

    // 4. Assemble the scheduler and the overlap-guarded driver.
    let store = Arc::new(PgStore::new(&pool));
    let scheduler = ActionScheduler::new(
        store,
        Arc::new(TemplateSynthesizer),
        config.scheduler.clone(),
    );
    let driver = Arc::new(TickDriver::new(scheduler));

    // 5. Back-fill profiles; rounds skip agents that still lack one.
    let provisioned = driver
        .scheduler()
        .provision_missing_profiles()
        .await
        .context("failed to derive missing profiles")?;
    if provisioned > 0 {
        info!(provisioned, "derived profiles for new agents");
    }

    // 6. Spawn the trigger API server.
    let api_state = Arc::new(ApiState::new(
        Arc::clone(&driver),
        &config.infrastructure.trigger_token,
    ));
    let server_config = ServerConfig {
        host: config.infrastructure.api_host.clone(),
        port: config.infrastructure.api_port,
    };
    let api_handle = tokio::spawn(async move {
        if let Err(err) = start_server(&server_config, api_state).await {
            tracing::error!(%err, "API server exited");
        }
    });

    // 7. Spawn the recurring round timer.
    let timer_handle = tokio::spawn(Arc::clone(&driver).run_timer_loop(
        Duration::from_secs(config.scheduler.tick_interval_secs),
        Duration::from_secs(config.scheduler.startup_delay_secs),
    ));

    // 8. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!(
        rounds_completed = driver.rounds_completed(),
        "shutdown signal received"
    );

    timer_handle.abort();
    api_handle.abort();
    pool.close().await;
    info!("waggle engine stopped");

    Ok(())
}
