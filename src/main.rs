use std::net::SocketAddr;

use anyhow::Context;

use cricket_scorer::build_router;
use cricket_scorer::config::AppConfig;
use cricket_scorer::database::connection::build_store;
use cricket_scorer::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("⚙️ Config: {}", config.get_config_info());

    let store = build_store(&config).await.context("failed to open the score store")?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let app = build_router(AppState::new(config, store));

    tracing::info!("🚀 Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
