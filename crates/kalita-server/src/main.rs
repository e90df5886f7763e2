mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderName},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use kalita_api::auth::{AppState, AppStateInner};
use kalita_db::Database;

use crate::config::Config;

/// How often expired sessions are pruned.
const SESSION_SWEEP_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kalita=debug,kalita_api=debug,kalita_db=info,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            eprintln!("       KALITA_JWT_SECRET and KALITA_API_KEY must be set.");
            eprintln!("       Set them in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        api_key: config.api_key.clone(),
        session_ttl: chrono::Duration::days(config.session_days),
        admin_emails: config.admin_emails.clone(),
    });

    tokio::spawn(run_session_sweep(state.clone(), SESSION_SWEEP_SECS));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, HeaderName::from_static("apikey")])
        .allow_credentials(false);

    let app = kalita_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Kalita server listening on {}", addr);
    info!("Sessions last {} days; {} admin email(s) configured", config.session_days, config.admin_emails.len());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Background task that deletes sessions past their expiry.
async fn run_session_sweep(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db_state = state.clone();
        let result = tokio::task::spawn_blocking(move || {
            db_state.db.delete_expired_sessions(&kalita_db::now_timestamp())
        })
        .await;

        match result {
            Ok(Ok(count)) if count > 0 => info!("Session sweep: pruned {} expired sessions", count),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Session sweep error: {}", e),
            Err(e) => warn!("Session sweep task failed: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
