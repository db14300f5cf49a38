//! Common helpers for end-to-end tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tower::ServiceExt;

use crate::app;
use crate::auth::PasswordEncoder;
use crate::auth::jwt::tests::create_hs512_token;
use crate::auth::password::MIN_COST;
use crate::config::{self, GateConfig};

pub const SECRET: &str = "e2e-secret-key-that-is-long-enough";
pub const BASIC_USERNAME: &str = "admin";
pub const BASIC_PASSWORD: &str = "s3cret";
pub const HOST: &str = "retro.example.com";

/// A router behind a gate built from environment-style configuration.
pub struct TestGate {
    router: Router,
}

impl TestGate {
    /// Gate with a token provider and a basic user.
    #[must_use]
    pub fn new(require_https: bool) -> Self {
        #[allow(clippy::expect_used)]
        let digest = PasswordEncoder::new(MIN_COST)
            .and_then(|encoder| encoder.hash(BASIC_PASSWORD))
            .expect("hash succeeds");
        Self::from_vars(&[
            (config::JWT_SECRET, SECRET.to_string()),
            (config::REQUIRE_HTTPS, require_https.to_string()),
            (config::BCRYPT_COST, MIN_COST.to_string()),
            (config::BASIC_USERNAME, BASIC_USERNAME.to_string()),
            (config::BASIC_PASSWORD_HASH, digest),
        ])
    }

    /// Gate with only the token provider, as deployed without a basic user.
    #[must_use]
    pub fn token_only() -> Self {
        Self::from_vars(&[(config::JWT_SECRET, SECRET.to_string())])
    }

    fn from_vars(vars: &[(&str, String)]) -> Self {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        #[allow(clippy::expect_used)]
        let config = GateConfig::from_lookup(|name| vars.get(name).cloned()).expect("valid config");
        #[allow(clippy::expect_used)]
        let gate = app::security_gate(&config).expect("gate builds");
        Self {
            router: app::router(Arc::new(gate)),
        }
    }

    /// Send a request through the gate and the handlers.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        #[allow(clippy::expect_used)]
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        response
    }
}

/// Request builder addressed to the test host over plaintext.
pub fn request(method: Method, path: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, HOST)
}

pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", create_hs512_token(subject, SECRET.as_bytes()))
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Finish a builder with an empty body.
pub fn empty(builder: axum::http::request::Builder) -> Request<Body> {
    #[allow(clippy::expect_used)]
    let request = builder.body(Body::empty()).expect("valid request");
    request
}

pub async fn body_string(response: Response<Body>) -> String {
    #[allow(clippy::expect_used)]
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8_lossy(&bytes).into_owned()
}
