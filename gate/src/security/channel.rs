//! Transport security checks and the https redirect.

use axum::http::request::Parts;
use axum::http::uri::{Authority, Scheme};
use axum::http::{HeaderName, Uri, header};

use super::policy::SecurityPolicy;

pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Whether the request arrived over an encrypted channel.
///
/// `X-Forwarded-Proto` is only consulted when the policy trusts the proxy in
/// front of the service.
#[must_use]
pub fn is_secure(parts: &Parts, policy: &SecurityPolicy) -> bool {
    if parts.uri.scheme() == Some(&Scheme::HTTPS) {
        return true;
    }
    if !policy.trust_forwarded_proto() {
        return false;
    }
    // A chain of proxies appends; the first entry is the client-facing hop.
    parts
        .headers
        .get(&X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// The https location for a plaintext request.
///
/// Returns `None` when the request names no host to redirect to.
#[must_use]
pub fn https_location(parts: &Parts, policy: &SecurityPolicy) -> Option<Uri> {
    let authority = request_authority(parts)?;
    let host = authority.host();
    let authority = match authority.port_u16().and_then(|port| policy.https_port_for(port)) {
        Some(443) | None => host.to_string(),
        Some(port) => format!("{host}:{port}"),
    };
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", |path_and_query| path_and_query.as_str());

    Uri::builder()
        .scheme(Scheme::HTTPS)
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()
        .ok()
}

fn request_authority(parts: &Parts) -> Option<Authority> {
    if let Some(authority) = parts.uri.authority() {
        return Some(authority.clone());
    }
    parts
        .headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}
