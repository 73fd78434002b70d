//! Sinopec BD Storefront - bilingual lubricant storefront service

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sinopec_bd_storefront::api::{build_app, AppState};
use sinopec_bd_storefront::catalog::Catalog;
use sinopec_bd_storefront::clients::assistant::AssistantClient;
use sinopec_bd_storefront::clients::orders::OrderClient;
use sinopec_bd_storefront::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let catalog = Arc::new(Catalog::builtin()?);
    if config.gemini_api_key.is_none() {
        tracing::info!("no assistant credential configured; oil finder runs in offline mode");
    }

    let state = AppState {
        catalog,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        orders: Arc::new(OrderClient::new(
            &config.order_endpoint,
            config.http_timeout_secs,
        )?),
        assistant: Arc::new(AssistantClient::new(
            config.gemini_api_key.clone(),
            config.http_timeout_secs,
        )?),
        coupon_rule: Arc::new(config.coupon.clone()),
    };
    let app = build_app(state);

    tracing::info!("🚀 Sinopec BD storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?,
        app,
    )
    .await?;
    Ok(())
}
