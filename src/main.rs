//! ShopPak Marketplace - storefront and seller dashboard service

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoppak_marketplace::api::{self, AppState};
use shoppak_marketplace::auth::TokenVerifier;
use shoppak_marketplace::config::AppConfig;
use shoppak_marketplace::media::LocalMediaStore;
use shoppak_marketplace::payment::MockGateway;
use shoppak_marketplace::publisher::EventBus;
use shoppak_marketplace::services::Marketplace;
use shoppak_marketplace::store::{DynStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let store: DynStore = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.db_max_connections).await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving the seeded in-memory demo store");
            Arc::new(MemoryStore::seeded())
        }
    };
    let events = EventBus::connect(config.nats_url.as_deref()).await;
    let gateway = Arc::new(MockGateway::new(config.payment_step_delay, config.payment_success_rate));
    let media = LocalMediaStore::new(&config.media_dir, &config.media_base_url);
    tokio::fs::create_dir_all(media.root()).await?;

    let state = AppState { market: Marketplace::new(store, events, gateway), verifier: TokenVerifier::new(&config.jwt_secret), media };
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, development = config.is_development(), "ShopPak marketplace listening");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
