//! Warden Server - Main Entry Point

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use warden_server::{api, authz, cache, config, ratelimit, session};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Warden Server");

    // Initialize Redis
    let redis = cache::create_redis_client(&config.redis_url).await?;

    // Session service
    let sessions = session::SessionStore::new(
        redis.clone(),
        session::SessionConfig {
            cookie_name: config.session_cookie.clone(),
            key_prefix: config.session_key_prefix.clone(),
            ttl_secs: config.session_ttl_secs,
        },
    );

    // Authorization gate with the process-wide role hierarchy
    let hierarchy = Arc::new(authz::RoleHierarchy::from_env());
    let gate = authz::AuthorizationGate::new(hierarchy);

    // Initialize throttle (optional)
    let rate_limiter = {
        let rl_config = ratelimit::RateLimitConfig::from_env();
        if rl_config.enabled {
            info!(
                max_attempts = rl_config.max_attempts,
                window_secs = rl_config.window_secs,
                block_secs = rl_config.block_secs,
                "Throttle enabled"
            );
            Some(ratelimit::RateLimiter::new(redis.clone(), rl_config))
        } else {
            info!("Throttling disabled by configuration");
            None
        }
    };

    // Build application state
    let state = api::AppState::new(redis, config.clone(), sessions, gate, rate_limiter);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Server shutdown complete");

    Ok(())
}
