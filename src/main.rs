#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use storefront::{
    config::{AppConfig, catalog, database},
    core::product,
    errors::Result,
    integrations::{conversions::ConversionClient, notify::EmailNotifier},
    web::{AppState, build_router},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load application configuration: {}", e))?;

    // 4. Connect and make sure tables exist
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog on first start
    match catalog::load_catalog(&config.catalog_path)? {
        Some(seed) => {
            product::seed_catalog(&db, &seed).await?;
        }
        None => info!(
            path = %config.catalog_path.display(),
            "No catalog file found; starting with the existing product table"
        ),
    }

    let notifier = EmailNotifier::new(config.email.clone());
    if !notifier.is_enabled() {
        warn!("SMTP_HOST/NOTIFY_EMAIL not set; order notifications are disabled");
    }

    let state = AppState {
        db: db.clone(),
        notifier: Arc::new(notifier),
        conversions: Arc::new(ConversionClient::new(config.conversions.clone())),
        session: Arc::new(config.session.clone()),
    };

    // 6. Serve until Ctrl-C
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down");
    db.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
