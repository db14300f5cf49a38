//! Guards for individual operations.
//!
//! The gate admits every request; operations that need an identity check it
//! here, explicitly.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use super::gate::SecurityContext;
use crate::auth::Principal;

/// Error returned when an operation refuses the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No identity; answered with the entry-point status.
    Unauthenticated(StatusCode),
    /// An identity that may not perform the operation.
    Forbidden,
    /// The handler runs without the gate in front of it.
    MissingSecurityContext,
}

impl AccessDenied {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthenticated(status) => status,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MissingSecurityContext => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated(_) => write!(f, "authentication required"),
            Self::Forbidden => write!(f, "access denied"),
            Self::MissingSecurityContext => write!(f, "no security context on request"),
        }
    }
}

impl std::error::Error for AccessDenied {}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Require the authenticated principal to be `expected`.
///
/// # Errors
/// `AccessDenied::Unauthenticated` for anonymous requests,
/// `AccessDenied::Forbidden` for any other principal.
pub fn require_subject<'a>(
    context: &'a SecurityContext,
    expected: &str,
) -> Result<&'a Principal, AccessDenied> {
    let principal = context
        .authentication
        .principal()
        .ok_or(AccessDenied::Unauthenticated(context.entry_point_status))?;
    if principal.name() != expected {
        tracing::debug!(principal = principal.name(), expected, "principal does not own resource");
        return Err(AccessDenied::Forbidden);
    }
    Ok(principal)
}

impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            tracing::error!(path = parts.uri.path(), "handler reached without the request gate");
            AccessDenied::MissingSecurityContext
        })
    }
}

/// Extractor that only succeeds for authenticated requests.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = SecurityContext::from_request_parts(parts, state).await?;
        match context.authentication.principal() {
            Some(principal) => Ok(Self(principal.clone())),
            None => Err(AccessDenied::Unauthenticated(context.entry_point_status)),
        }
    }
}
