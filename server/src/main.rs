mod chat;
mod config;
mod error;
mod events;
mod presence;
mod routes;
mod state;
mod ws;

use chrono::Utc;
use tokio::net::TcpListener;

use config::{generate_config_template, Config};
use events::ServerMaintenance;
use state::AppState;
use ws::broadcast::broadcast_to_all;
use ws::protocol::envelope;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "huddle_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "huddle_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("huddle server v{} starting", env!("CARGO_PKG_VERSION"));

    // Build application state and router
    let app_state = AppState::new();
    let app = routes::build_router(app_state.clone());

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await?;

    Ok(())
}

/// Wait for ctrl-c, then tell every client the hub is going away before the
/// listener stops accepting. Informational only — clients are not waited on.
async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }

    tracing::info!("shutdown signal received, notifying clients");
    broadcast_to_all(
        &state.connections,
        &envelope(
            "serverMaintenance",
            "",
            &ServerMaintenance {
                message: "server is shutting down for maintenance".to_string(),
                timestamp: Utc::now(),
            },
        ),
    );
}
