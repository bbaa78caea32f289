mod api;
mod app;
mod config;
mod db;
mod domain;
mod error;
mod estimator;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;
use std::sync::Arc;

use config::OracleProvider;
use services::{IntentOracle, KeywordOracle, LlmOracle, RedisCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting Scopeline backend"
    );

    // Create database pool and apply migrations (schema + seeded reference
    // data: dynamic questions and production standards)
    let pool = db::create_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // Create Redis cache
    let cache = RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await?;
    tracing::info!("Redis cache initialized");

    // Create the intent oracle
    let oracle: Arc<dyn IntentOracle> = match settings.oracle_provider {
        OracleProvider::Llm => Arc::new(LlmOracle::new(
            &settings.oracle_url,
            &settings.oracle_token,
            settings.oracle_timeout_seconds,
        )?),
        OracleProvider::Keyword => Arc::new(KeywordOracle),
    };
    tracing::info!(oracle = oracle.name(), "Intent oracle initialized");

    // Optionally check oracle health (non-blocking)
    tokio::spawn({
        let oracle = oracle.clone();
        async move {
            match oracle.health_check().await {
                Ok(()) => tracing::info!("Intent oracle is healthy"),
                Err(e) => tracing::warn!(
                    error = %e,
                    "Oracle health check failed - classification will degrade to defaults"
                ),
            }
        }
    });

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), cache, oracle);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
