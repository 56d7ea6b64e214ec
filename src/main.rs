#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, API_PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = sampletrack_api::config::config();
    tracing::info!("Starting Sampletrack API in {:?} mode", config.environment);

    // Allow tests or deployments to override port via env
    let port = std::env::var("SAMPLETRACK_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.api.port);

    sampletrack_api::serve(port).await.expect("server");
}
