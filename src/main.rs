//! OpenSASE Storefront - demo storefront back end

use anyhow::{Context, Result};
use opensase_storefront::config::AppConfig;
use opensase_storefront::domain::events::{EventPublisher, NoopPublisher};
use opensase_storefront::infrastructure::{MemoryStore, NatsPublisher, PgStore};
use opensase_storefront::services::{Repositories, Storefront};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn repositories(config: &AppConfig) -> Result<Repositories> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections).await.context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            store.seed_catalog().await.context("seeding catalog")?;
            tracing::info!("using PostgreSQL store");
            Ok(Repositories::from_store(Arc::new(store)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Ok(Repositories::from_store(Arc::new(MemoryStore::seeded()?)))
        }
    }
}

async fn publisher(config: &AppConfig) -> Arc<dyn EventPublisher> {
    let Some(url) = &config.nats_url else {
        return Arc::new(NoopPublisher);
    };
    match NatsPublisher::connect(url, config.subject_prefix.clone()).await {
        Ok(nats) => {
            tracing::info!(url = %url, prefix = %config.subject_prefix, "publishing events to NATS");
            Arc::new(nats)
        }
        Err(e) => {
            tracing::warn!(error = %e, "NATS unavailable, events will be dropped");
            Arc::new(NoopPublisher)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let shop = Storefront::new(repositories(&config).await?, publisher(&config).await);
    let app = opensase_storefront::api::router(shop)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("OpenSASE Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
