//! Medify Storefront - pharmacy cart and checkout service

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medify_storefront::config::Config;
use medify_storefront::http::{router, AppState};
use medify_storefront::storage::SqliteStore;
use medify_storefront::Storefront;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "NATS unavailable, order events will not be published");
                None
            }
        },
        None => None,
    };

    let storefront = Storefront::new(store, config.checkout.clone());
    let app = router(AppState::new(storefront, nats));

    tracing::info!("Medify storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
