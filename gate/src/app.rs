//! Wiring of the gate and the routes it protects.
//!
//! The gate admits every request; the team routes check ownership themselves
//! and the console is the one route other same-origin pages may frame.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Router, middleware};

use crate::auth::{
    AuthenticationManager, InMemoryUserStore, JwtAuthenticationProvider,
    PasswordAuthenticationProvider,
};
use crate::config::{ConfigError, GateConfig};
use crate::security::{
    AccessDenied, Authenticated, RequestGate, SecurityContext, SecurityPolicy, request_gate,
    require_subject,
};

/// Build the gate from configuration.
///
/// The token provider is always registered. The password provider is only
/// registered when a basic user is configured; without it, basic
/// credentials never authenticate.
///
/// # Errors
///
/// Returns an error if the configuration cannot produce a password encoder
/// or the password provider.
pub fn security_gate(config: &GateConfig) -> Result<RequestGate, ConfigError> {
    let mut manager = AuthenticationManager::new()
        .with_provider(Arc::new(JwtAuthenticationProvider::new(config.jwt.clone())));

    if let Some(user) = &config.basic_user {
        let encoder = config.password_encoder()?;
        let users = InMemoryUserStore::new().with_user(&user.username, &user.password_hash);
        let provider = PasswordAuthenticationProvider::new(Arc::new(users), encoder).map_err(|e| {
            ConfigError::InvalidValue {
                name: crate::config::BCRYPT_COST.to_string(),
                message: e.to_string(),
            }
        })?;
        manager = manager.with_provider(Arc::new(provider));
        tracing::info!(username = %user.username, "basic authentication enabled");
    }
    tracing::info!(providers = manager.provider_count(), "authentication providers registered");

    let policy = SecurityPolicy::new(config.require_https)
        .with_trust_forwarded_proto(config.trust_forwarded_proto);

    Ok(RequestGate::new(Arc::new(policy), Arc::new(manager)))
}

/// All routes, behind the gate.
pub fn router(gate: Arc<RequestGate>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(me))
        .route("/api/team/{team_id}", get(team))
        .route("/api/team/{team_id}/thought", post(add_thought))
        .route("/h2-console", get(console))
        .route("/h2-console/{*path}", get(console))
        .layer(middleware::from_fn_with_state(gate, request_gate))
}

async fn health() -> &'static str {
    "OK"
}

async fn me(Authenticated(principal): Authenticated) -> String {
    principal.name().to_string()
}

async fn team(
    Path(team_id): Path<String>,
    context: SecurityContext,
) -> Result<String, AccessDenied> {
    let principal = require_subject(&context, &team_id)?;
    Ok(format!("team {}", principal.name()))
}

async fn add_thought(
    Path(team_id): Path<String>,
    context: SecurityContext,
    body: String,
) -> Result<impl IntoResponse, AccessDenied> {
    require_subject(&context, &team_id)?;
    tracing::debug!(team_id = %team_id, bytes = body.len(), "thought received");
    Ok(StatusCode::CREATED)
}

async fn console() -> Html<&'static str> {
    Html("<!doctype html><title>Database console</title>")
}
