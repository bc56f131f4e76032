mod carousell;
mod models;
mod server;

use std::sync::Arc;

use anyhow::Context;
use carousell::CarousellClient;
use server::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🛒 Carousell Feed - marketplace searches as JSON Feed");
    info!("=====================================================");

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let address = format!("{}:{}", host, port);

    let client = CarousellClient::new()?;
    let state = AppState {
        api: Arc::new(client),
    };

    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Listening on http://{}", address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
