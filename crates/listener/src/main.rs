use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_common::db;
use herald_dispatch::service::DispatchService;
use herald_dispatch::store::PgNotificationStore;
use herald_listener::consumer;
use herald_notifier::delivery_client_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_listener=info,herald_dispatch=info".into()),
        )
        .json()
        .init();

    tracing::info!("Herald listener starting...");

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let delivery = delivery_client_from_config(&config)?;
    let service = DispatchService::new(delivery, Arc::new(PgNotificationStore::new(pool)));

    if let Err(e) = consumer::run(&config, service).await {
        tracing::error!(error = %e, "Notification consumer exited with error");
        return Err(e);
    }

    tracing::info!("Herald listener stopped.");
    Ok(())
}
