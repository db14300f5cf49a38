//! `Authorization` header parsing for the basic and bearer schemes.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{AuthenticationFailure, Credentials};

const BASIC_SCHEME: &str = "basic";
const BEARER_SCHEME: &str = "bearer";

/// Split `Authorization` into its scheme and parameters.
fn authorization(headers: &HeaderMap) -> Option<(&str, &str)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    match value.split_once(' ') {
        Some((scheme, rest)) => Some((scheme, rest.trim())),
        None => Some((value, "")),
    }
}

/// Read basic credentials.
///
/// Returns `None` when the request does not use the basic scheme.
///
/// # Errors
/// Returns `AuthenticationFailure::MalformedHeader` when the scheme is basic
/// but the payload is not base64 of `username:password`.
pub fn basic_credentials(
    headers: &HeaderMap,
) -> Option<Result<Credentials, AuthenticationFailure>> {
    let (scheme, encoded) = authorization(headers)?;
    if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
        return None;
    }
    Some(decode_basic(encoded))
}

/// Whether the request uses the basic scheme, without decoding it.
#[must_use]
pub fn uses_basic_scheme(headers: &HeaderMap) -> bool {
    authorization(headers).is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(BASIC_SCHEME))
}

fn decode_basic(encoded: &str) -> Result<Credentials, AuthenticationFailure> {
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| AuthenticationFailure::MalformedHeader(format!("invalid base64: {e}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AuthenticationFailure::MalformedHeader("credentials are not UTF-8".to_string()))?;
    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        AuthenticationFailure::MalformedHeader("missing ':' between username and password".to_string())
    })?;

    Ok(Credentials::UsernamePassword {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Read a bearer token, if the request carries a non-empty one.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<Credentials> {
    let (scheme, token) = authorization(headers)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return None;
    }
    Some(Credentials::BearerToken(token.to_string()))
}
