use anyhow::{Context, Result};
use image_hoster::{app, config::Config, storage::Storage, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "image_hoster=info,server=info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "Configuration loaded");

    let storage = Arc::new(
        Storage::open(&config.data_file).context("Failed to initialize storage")?,
    );

    let addr = config.socket_addr();
    let app_state = Arc::new(AppState::new(storage, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "Image hoster listening");

    axum::serve(listener, app(app_state))
        .await
        .context("Failed to start server")?;

    Ok(())
}
