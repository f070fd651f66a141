mod api;
mod middleware;
mod scheduler;

use std::{sync::Arc, time::Duration};

use asxdb_provider::AlphaVantageClient;
use asxdb_scheduler::{CycleLock, PgScheduler};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(asxdb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = asxdb_db::PoolConfig::from_app_config(&config);
    let pool = asxdb_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = asxdb_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let provider = AlphaVantageClient::from_app_config(&config)?;
    let lock = CycleLock::new(Duration::from_millis(config.scrape_lock_wait_ms));
    let scrape = Arc::new(PgScheduler::postgres(pool.clone(), provider, lock));

    let _jobs = scheduler::build_scheduler(Arc::clone(&scrape), &config.scrape_cron).await?;

    let auth = AuthState::from_env(matches!(config.env, asxdb_core::Environment::Development))?;
    let state = AppState {
        pool,
        scheduler: scrape,
        config: Arc::clone(&config),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "asxdb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
