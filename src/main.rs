use tracing_subscriber::EnvFilter;

use icfgen::config::AppConfig;
use icfgen::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("icfgen=info,tower_http=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %config.bind_addr,
        summarize = config.chat.is_some(),
        "icfgen starting v{}",
        env!("CARGO_PKG_VERSION")
    );

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.bind_addr, "cannot bind listener");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, server::router(config)).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
