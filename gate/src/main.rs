#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use gate::app;
use gate::config::GateConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        require_https = config.require_https,
        trust_forwarded_proto = config.trust_forwarded_proto,
        jwt_algorithm = ?config.jwt.algorithm(),
        bcrypt_cost = config.bcrypt_cost,
        listen_port = config.listen_port,
        "Loaded configuration"
    );

    let gate = match app::security_gate(&config) {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            tracing::error!("Failed to build request gate: {e}");
            std::process::exit(1);
        }
    };

    let app = app::router(gate);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
