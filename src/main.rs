//! YaMDb - A review aggregation service

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yamdb::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
    services::create_mailer,
};

/// How often expired access tokens are purged
const TOKEN_PURGE_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yamdb=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting YaMDb...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let cache = create_cache(&config.cache);
    let mailer = create_mailer(&config.email)?;
    tracing::info!("Mail transport: {:?}", config.email.transport);

    let state = AppState::new(pool.clone(), cache, mailer, config.auth.token_ttl_days);

    if let Some(admin) = &config.admin {
        state.user_service.ensure_superuser(admin).await?;
    }

    // Purge expired access tokens (runs hourly)
    {
        let user_service = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                TOKEN_PURGE_INTERVAL_SECS,
            ));
            loop {
                interval.tick().await;
                match user_service.purge_expired_tokens().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!("Purged {} expired access tokens", purged),
                    Err(e) => tracing::warn!("Failed to purge expired tokens: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
