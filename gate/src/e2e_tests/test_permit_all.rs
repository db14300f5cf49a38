//! The authorization stage admits every request.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_anonymous_requests_reach_handlers() {
    let test = TestGate::new(false);

    let health = test.send(empty(request(Method::GET, "/health"))).await;
    assert_eq!(health.status(), StatusCode::OK);

    let console = test.send(empty(request(Method::GET, "/h2-console/login.do"))).await;
    assert_eq!(console.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_routes_reach_the_router() {
    let test = TestGate::new(false);
    let response = test.send(empty(request(Method::GET, "/no/such/route"))).await;

    // The router answers, not the gate.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gate_never_forbids() {
    let test = TestGate::new(false);

    for path in ["/", "/health", "/api/me", "/api/team/abc", "/h2-console", "/admin/anything"] {
        for authorization in [None, Some("Bearer garbage".to_string()), Some(bearer("abc"))] {
            let mut builder = request(Method::GET, path);
            if let Some(value) = &authorization {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            let response = test.send(empty(builder)).await;
            assert_ne!(
                response.status(),
                StatusCode::FORBIDDEN,
                "{path} with {authorization:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_forbidden_comes_from_the_operation_guard() {
    let test = TestGate::new(false);
    let response = test
        .send(empty(
            request(Method::GET, "/api/team/other-team").header(header::AUTHORIZATION, bearer("abc")),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
