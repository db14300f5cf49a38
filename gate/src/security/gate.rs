//! The request gate.
//!
//! Life of a request:
//! 1. Channel check: plaintext requests for secure paths are redirected.
//! 2. Basic authentication, when the request carries basic credentials.
//!    A failure here stops the request at the entry point.
//! 3. Token authentication, when the request is still anonymous and carries
//!    a bearer token. A failure here leaves the request anonymous.
//! 4. Authorization against the ordered access rules.
//!
//! # Invariants
//! - `evaluate` never mutates the gate; it is safe to call concurrently.
//! - Authentication runs at most once per request: a request that already
//!   carries a `SecurityContext` keeps it.

use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{StatusCode, Uri};

use super::channel::{https_location, is_secure};
use super::policy::{Access, SecurityPolicy};
use crate::auth::basic::{basic_credentials, bearer_token};
use crate::auth::{Authentication, AuthenticationManager};

/// Authentication outcome attached to an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    pub authentication: Authentication,
    /// Status the entry point answers with, for guards further down.
    pub entry_point_status: StatusCode,
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(Authentication),
    RedirectToHttps(Uri),
    Reject(StatusCode),
}

/// Applies a `SecurityPolicy` using an `AuthenticationManager`.
#[derive(Debug, Clone)]
pub struct RequestGate {
    policy: Arc<SecurityPolicy>,
    manager: Arc<AuthenticationManager>,
}

impl RequestGate {
    #[must_use]
    pub fn new(policy: Arc<SecurityPolicy>, manager: Arc<AuthenticationManager>) -> Self {
        for rule in policy.unreachable_rules() {
            tracing::warn!(
                matcher = %rule.matcher,
                access = ?rule.access,
                "access rule follows a rule matching every request and will never apply"
            );
        }
        Self { policy, manager }
    }

    #[must_use]
    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Decide on a request from its head.
    #[must_use]
    pub fn evaluate(&self, parts: &Parts) -> GateDecision {
        let path = parts.uri.path();

        if self.policy.requires_secure_channel(path) && !is_secure(parts, &self.policy) {
            return match https_location(parts, &self.policy) {
                Some(location) => {
                    tracing::debug!(path, %location, "redirecting plaintext request to https");
                    GateDecision::RedirectToHttps(location)
                }
                None => {
                    tracing::debug!(path, "plaintext request without a host to redirect to");
                    GateDecision::Reject(StatusCode::BAD_REQUEST)
                }
            };
        }

        let authentication = match parts.extensions.get::<SecurityContext>() {
            Some(context) => context.authentication.clone(),
            None => match self.authenticate(parts) {
                Ok(authentication) => authentication,
                Err(status) => return GateDecision::Reject(status),
            },
        };

        self.authorize(path, authentication)
    }

    fn authenticate(&self, parts: &Parts) -> Result<Authentication, StatusCode> {
        let mut authentication = Authentication::Anonymous;

        if let Some(credentials) = basic_credentials(&parts.headers) {
            let principal = credentials
                .and_then(|credentials| self.manager.authenticate(&credentials))
                .map_err(|failure| {
                    tracing::debug!(%failure, "basic authentication failed");
                    self.policy.entry_point_status()
                })?;
            tracing::debug!(principal = principal.name(), "basic authentication succeeded");
            authentication = Authentication::Authenticated(principal);
        }

        if authentication.is_authenticated() {
            return Ok(authentication);
        }

        if let Some(credentials) = bearer_token(&parts.headers) {
            match self.manager.authenticate(&credentials) {
                Ok(principal) => {
                    tracing::debug!(principal = principal.name(), "token authentication succeeded");
                    authentication = Authentication::Authenticated(principal);
                }
                Err(failure) => {
                    tracing::debug!(%failure, "token authentication failed, continuing anonymously");
                }
            }
        }

        Ok(authentication)
    }

    fn authorize(&self, path: &str, authentication: Authentication) -> GateDecision {
        let entry_point = self.policy.entry_point_status();
        match (self.policy.access_for(path), authentication.is_authenticated()) {
            (Access::PermitAll, _) | (Access::Authenticated, true) => {
                GateDecision::Allow(authentication)
            }
            (Access::Authenticated | Access::DenyAll, false) => {
                tracing::debug!(path, "anonymous request needs authentication");
                GateDecision::Reject(entry_point)
            }
            (Access::DenyAll, true) => {
                tracing::debug!(path, "access denied");
                GateDecision::Reject(StatusCode::FORBIDDEN)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::{TEST_SECRET, create_hs512_token};
    use crate::auth::password::MIN_COST;
    use crate::auth::{
        AuthenticationMethod, InMemoryUserStore, JwtAuthenticationProvider, JwtConfig,
        PasswordAuthenticationProvider, PasswordEncoder, Principal,
    };
    use crate::security::pattern::RequestMatcher;
    use crate::security::policy::AccessRule;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn manager() -> Arc<AuthenticationManager> {
        let encoder = PasswordEncoder::new(MIN_COST).expect("valid cost");
        let users = InMemoryUserStore::new()
            .with_user("admin", encoder.hash("s3cret").expect("hash succeeds"));
        Arc::new(
            AuthenticationManager::new()
                .with_provider(Arc::new(JwtAuthenticationProvider::new(
                    JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret"),
                )))
                .with_provider(Arc::new(
                    PasswordAuthenticationProvider::new(Arc::new(users), encoder)
                        .expect("provider builds"),
                )),
        )
    }

    fn gate(policy: SecurityPolicy) -> RequestGate {
        RequestGate::new(Arc::new(policy), manager())
    }

    fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().method(method).uri(uri).header("host", "retro.example.com");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).expect("valid request").into_parts().0
    }

    fn basic(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
    }

    fn bearer(subject: &str) -> String {
        format!("Bearer {}", create_hs512_token(subject, TEST_SECRET))
    }

    fn principal(name: &str, method: AuthenticationMethod) -> Authentication {
        Authentication::Authenticated(Principal::new(name, method).expect("valid principal"))
    }

    #[test]
    fn test_plaintext_redirected_when_https_required() {
        let gate = gate(SecurityPolicy::new(true));
        let parts = request(Method::GET, "/api/team/abc", &[("authorization", bearer("abc").as_str())]);

        match gate.evaluate(&parts) {
            GateDecision::RedirectToHttps(location) => {
                assert_eq!(location.to_string(), "https://retro.example.com/api/team/abc");
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_forwarded_https_passes_channel_check() {
        let gate = gate(SecurityPolicy::new(true));
        let parts = request(Method::GET, "/health", &[("x-forwarded-proto", "https")]);

        assert_eq!(gate.evaluate(&parts), GateDecision::Allow(Authentication::Anonymous));
    }

    #[test]
    fn test_plaintext_allowed_when_https_not_required() {
        let gate = gate(SecurityPolicy::new(false));
        let parts = request(Method::GET, "/health", &[]);

        assert_eq!(gate.evaluate(&parts), GateDecision::Allow(Authentication::Anonymous));
    }

    #[test]
    fn test_anonymous_request_is_permitted() {
        let gate = gate(SecurityPolicy::new(false));
        for path in ["/", "/api/team/abc", "/h2-console", "/anything/at/all"] {
            assert_eq!(
                gate.evaluate(&request(Method::GET, path, &[])),
                GateDecision::Allow(Authentication::Anonymous)
            );
        }
    }

    #[test]
    fn test_valid_bearer_token_authenticates() {
        let gate = gate(SecurityPolicy::new(false));
        let parts = request(Method::GET, "/api/team/abc", &[("authorization", bearer("abc").as_str())]);

        assert_eq!(
            gate.evaluate(&parts),
            GateDecision::Allow(principal("abc", AuthenticationMethod::BearerToken))
        );
    }

    #[test]
    fn test_invalid_bearer_token_continues_anonymously() {
        let gate = gate(SecurityPolicy::new(false));
        let parts = request(Method::GET, "/api/team/abc", &[("authorization", "Bearer not.a.jwt")]);

        assert_eq!(gate.evaluate(&parts), GateDecision::Allow(Authentication::Anonymous));
    }

    #[test]
    fn test_valid_basic_credentials_authenticate() {
        let gate = gate(SecurityPolicy::new(false));
        let parts = request(Method::GET, "/h2-console", &[("authorization", basic("admin", "s3cret").as_str())]);

        assert_eq!(
            gate.evaluate(&parts),
            GateDecision::Allow(principal("admin", AuthenticationMethod::Basic))
        );
    }

    #[test]
    fn test_invalid_basic_credentials_hit_entry_point() {
        let gate = gate(SecurityPolicy::new(false));

        let wrong_password = request(Method::GET, "/", &[("authorization", basic("admin", "nope").as_str())]);
        assert_eq!(gate.evaluate(&wrong_password), GateDecision::Reject(StatusCode::UNAUTHORIZED));

        let garbage = request(Method::GET, "/", &[("authorization", "Basic %%%")]);
        assert_eq!(gate.evaluate(&garbage), GateDecision::Reject(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_basic_credentials_without_password_provider_hit_entry_point() {
        let jwt_only = Arc::new(AuthenticationManager::new().with_provider(Arc::new(
            JwtAuthenticationProvider::new(
                JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret"),
            ),
        )));
        let gate = RequestGate::new(Arc::new(SecurityPolicy::new(false)), jwt_only);
        let parts = request(Method::GET, "/", &[("authorization", basic("admin", "s3cret").as_str())]);

        assert_eq!(gate.evaluate(&parts), GateDecision::Reject(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_state_changing_request_without_csrf_token_reaches_authentication() {
        let gate = gate(SecurityPolicy::new(false));

        let anonymous = request(Method::POST, "/api/team/abc/thought", &[]);
        assert_eq!(gate.evaluate(&anonymous), GateDecision::Allow(Authentication::Anonymous));

        let with_token = request(Method::DELETE, "/api/team/abc/thought/1", &[("authorization", bearer("abc").as_str())]);
        assert_eq!(
            gate.evaluate(&with_token),
            GateDecision::Allow(principal("abc", AuthenticationMethod::BearerToken))
        );
    }

    #[test]
    fn test_existing_security_context_is_reused() {
        let gate = gate(SecurityPolicy::new(false));
        let mut parts = request(Method::GET, "/", &[("authorization", "Bearer not.a.jwt")]);
        let earlier = principal("abc", AuthenticationMethod::BearerToken);
        parts.extensions.insert(SecurityContext {
            authentication: earlier.clone(),
            entry_point_status: StatusCode::UNAUTHORIZED,
        });

        assert_eq!(gate.evaluate(&parts), GateDecision::Allow(earlier));
    }

    #[test]
    fn test_authenticated_rule_when_reachable() {
        let policy = SecurityPolicy::new(false).with_access_rules(vec![
            AccessRule {
                matcher: RequestMatcher::path("/health"),
                access: Access::PermitAll,
            },
            AccessRule {
                matcher: RequestMatcher::path("/admin/**"),
                access: Access::DenyAll,
            },
            AccessRule {
                matcher: RequestMatcher::AnyRequest,
                access: Access::Authenticated,
            },
        ]);
        let gate = gate(policy);

        assert_eq!(
            gate.evaluate(&request(Method::GET, "/health", &[])),
            GateDecision::Allow(Authentication::Anonymous)
        );
        assert_eq!(
            gate.evaluate(&request(Method::GET, "/api/team/abc", &[])),
            GateDecision::Reject(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            gate.evaluate(&request(Method::GET, "/api/team/abc", &[("authorization", bearer("abc").as_str())])),
            GateDecision::Allow(principal("abc", AuthenticationMethod::BearerToken))
        );
        assert_eq!(
            gate.evaluate(&request(Method::GET, "/admin/x", &[("authorization", bearer("abc").as_str())])),
            GateDecision::Reject(StatusCode::FORBIDDEN)
        );
        assert_eq!(
            gate.evaluate(&request(Method::GET, "/admin/x", &[])),
            GateDecision::Reject(StatusCode::UNAUTHORIZED)
        );
    }
}
