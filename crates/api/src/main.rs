use std::sync::Arc;

use anyhow::Context;

use feedrun_infra::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    feedrun_observability::init();

    let config = EngineConfig::from_env()?;
    let services = Arc::new(
        feedrun_api::app::services::AppServices::from_config(&config)
            .with_context(|| format!("failed to open job store at {}", config.data_dir.display()))?,
    );
    let app = feedrun_api::app::build_app(services);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse().with_context(|| format!("invalid PORT '{raw}'"))?,
        Err(_) => 3000,
    };

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        mode = %config.execution_mode,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
