// Aquachain - API Server
// Loads one dataset at startup and serves read-only analytics over it

use anyhow::{Context, Result};
use aquachain::api::{router, AppState};
use aquachain::{Config, Dataset};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🌐 Aquachain - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env()?;

    let dataset = match &config.data_dir {
        Some(dir) => Dataset::from_dir(dir)?,
        None => {
            tracing::warn!("AQUACHAIN_DATA_DIR not set, serving demo data");
            Dataset::demo()
        }
    };
    println!("✓ Loaded {}", dataset.summary());

    let app = router(AppState::new(dataset, config.engine));

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Report: http://{}/api/report", addr);
    println!("   Graph:  http://{}/api/graph", addr);
    println!("\n   Press Ctrl+C to stop\n");

    tracing::info!(%addr, "Listening");
    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
