//! gemini-bridge server binary.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use gemini_bridge::config::{Cli, Config};
use gemini_bridge::feedback::InMemoryFeedbackStore;
use gemini_bridge::provider::gemini::GeminiProvider;
use gemini_bridge::server::router::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "gemini_bridge=debug,tower_http=debug"
    } else {
        "gemini_bridge=info,tower_http=info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("gemini-bridge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);

    info!(
        model = config.provider.model,
        temperature = config.provider.temperature,
        base_url = config.provider.base_url,
        "Configuration loaded"
    );
    if config.provider.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat requests will fail until it is");
    }

    let provider = GeminiProvider::new(config.provider.clone())?;
    let state = Arc::new(AppState::new(
        Arc::new(provider),
        InMemoryFeedbackStore::shared(),
    ));

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen;
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
