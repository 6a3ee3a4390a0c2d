use land_backend::api;
use land_backend::config::{Config, LogFormat};
use land_backend::engine::directory::RoomDirectory;
use land_backend::metrics;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let config = Config::load();
    init_tracing(config.log_format);
    metrics::register_metrics();

    let directory = RoomDirectory::new();
    let app = api::router(directory);

    let addr = config.listen_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {addr}: {e}");
            return;
        }
    };

    tracing::info!("Land backend listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
    }
}
