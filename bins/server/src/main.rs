//! Budget management API server.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budgetaire_api::{AppState, create_router};
use budgetaire_core::storage::{StorageProvider, StorageService};
use budgetaire_db::{TwoFactorRepository, connect};
use budgetaire_shared::{AppConfig, EmailService, JwtConfig, JwtService};

/// How often spent and expired login codes are purged.
const CODE_CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budgetaire=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let storage = StorageService::from_provider(StorageProvider::from(&config.storage))?;
    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));
    let email_service = EmailService::new(config.email.clone());
    if config.email.enabled {
        info!(
            smtp_host = %config.email.smtp_host,
            smtp_port = %config.email.smtp_port,
            "Email service configured"
        );
    } else {
        warn!("Email delivery disabled, login codes will only be logged");
    }

    let cleanup = TwoFactorRepository::new(db.clone());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CODE_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            match cleanup.cleanup_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged stale login codes"),
                Err(e) => warn!(error = %e, "Login code cleanup failed"),
            }
        }
    });

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        email_service: Arc::new(email_service),
        storage: Arc::new(storage),
        code_ttl_secs: config.two_factor.code_ttl_secs,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
