//! Moodlens HTTP server
//!
//! Starts an Axum web server that turns journal entries into structured
//! emotional analyses via the configured model pool.

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use moodlens::cli::{Cli, Command};
use moodlens::{config::Config, handlers, middleware, telemetry};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `moodlens config` prints a template and exits
    if let Some(Command::Config { output }) = cli.command {
        let template = moodlens::cli::generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {path}");
            }
            None => print!("{template}"),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::from_file(&cli.config)?;

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting Moodlens server on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        preset = %config.analysis.preset,
        pool_size = config.active_preset().models().len(),
        "Analysis preset selected"
    );

    let host = config.server.host.clone();
    let port = config.server.port;

    // Build application state (validates the provider credential is present)
    let state = handlers::AppState::new(config)?;

    // Build router
    let app = Router::new()
        .route("/analyze", post(handlers::analyze::handler))
        .route("/health", get(handlers::health::handler))
        .route("/metrics", get(handlers::metrics::handler))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Create socket address
    let addr = SocketAddr::from((
        host.parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
