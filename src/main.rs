use anyhow::Result;
use linkpulse::config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;

    init_tracing(&config.log_level, &config.log_format);

    tracing::info!("Starting linkpulse v{}", env!("CARGO_PKG_VERSION"));
    config.print_summary();

    linkpulse::server::run(config).await
}

fn init_tracing(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
