//! Axum middleware running the request gate in front of a router.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::channel::is_secure;
use super::gate::{GateDecision, RequestGate, SecurityContext};
use super::headers::write_security_headers;
use crate::auth::basic::uses_basic_scheme;

/// Evaluate the gate; admitted requests continue with a `SecurityContext`.
///
/// Redirects and rejections are answered here with an empty body. Every
/// response, including those, carries the security headers. Requests with
/// basic credentials are evaluated on the blocking pool, where bcrypt runs.
pub async fn request_gate(
    State(gate): State<Arc<RequestGate>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let secure = is_secure(&parts, gate.policy());

    let (decision, mut parts) = evaluate(&gate, parts).await;

    let mut response = match decision {
        GateDecision::Allow(authentication) => {
            parts.extensions.insert(SecurityContext {
                authentication,
                entry_point_status: gate.policy().entry_point_status(),
            });
            next.run(Request::from_parts(parts, body)).await
        }
        GateDecision::RedirectToHttps(location) => {
            (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
        }
        GateDecision::Reject(status) => {
            tracing::debug!(path = %path, status = status.as_u16(), "request rejected by gate");
            status.into_response()
        }
    };

    write_security_headers(response.headers_mut(), gate.policy(), &path, secure);
    response
}

async fn evaluate(gate: &Arc<RequestGate>, parts: Parts) -> (GateDecision, Parts) {
    if !uses_basic_scheme(&parts.headers) {
        return (gate.evaluate(&parts), parts);
    }

    let gate = Arc::clone(gate);
    let handle = tokio::task::spawn_blocking(move || {
        let decision = gate.evaluate(&parts);
        (decision, parts)
    });
    match handle.await {
        Ok(evaluated) => evaluated,
        Err(e) => {
            tracing::error!(error = %e, "gate evaluation task failed");
            let (parts, ()) = axum::http::Request::new(()).into_parts();
            (GateDecision::Reject(StatusCode::INTERNAL_SERVER_ERROR), parts)
        }
    }
}
