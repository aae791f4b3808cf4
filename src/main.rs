#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = chittoor_health_api::config::config();
    tracing::info!("Starting health registry API in {:?} mode", config.environment);

    let port = chittoor_health_api::server::port_from_env();
    chittoor_health_api::server::serve(port).await
}
