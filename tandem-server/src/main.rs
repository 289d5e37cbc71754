use anyhow::{Context, Result};
use clap::Parser;
use tandem_core::utils::SIGNALING_PATH;
use tandem_server::{ServerConfig, SignalingService, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    info!(?config, "Initializing signaling relay");

    let service = SignalingService::from_config(&config);
    let app = router(service);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Signaling relay listening on ws://{}{}", addr, SIGNALING_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Server error")?;

    Ok(())
}
