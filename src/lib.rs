pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;

use anyhow::Context;

/// Bind and run the HTTP server until the task is cancelled.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Sampletrack API listening on http://{}", bind_addr);
    axum::serve(listener, handlers::router())
        .await
        .context("server error")?;
    Ok(())
}
