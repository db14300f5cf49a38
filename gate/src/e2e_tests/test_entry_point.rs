//! Authentication failures answer exactly 401, never a redirect.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

async fn assert_entry_point(test: &TestGate, builder: axum::http::request::Builder) {
    let response = test.send(empty(builder)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!response.headers().contains_key(header::LOCATION));
    assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_no_credentials_on_protected_operation() {
    let test = TestGate::new(false);
    assert_entry_point(&test, request(Method::GET, "/api/me")).await;
    assert_entry_point(&test, request(Method::GET, "/api/team/abc")).await;
}

#[tokio::test]
async fn test_invalid_token_on_protected_operation() {
    let test = TestGate::new(false);

    assert_entry_point(
        &test,
        request(Method::GET, "/api/me").header(header::AUTHORIZATION, "Bearer not.a.jwt"),
    )
    .await;

    let foreign_token = format!(
        "Bearer {}",
        crate::auth::jwt::tests::create_hs512_token("abc", b"some-other-secret-entirely")
    );
    assert_entry_point(
        &test,
        request(Method::GET, "/api/team/abc").header(header::AUTHORIZATION, foreign_token),
    )
    .await;
}

#[tokio::test]
async fn test_invalid_basic_credentials_on_any_route() {
    let test = TestGate::new(false);

    // Basic failures stop at the gate, even on public routes.
    assert_entry_point(
        &test,
        request(Method::GET, "/health").header(header::AUTHORIZATION, basic(BASIC_USERNAME, "wrong")),
    )
    .await;
    assert_entry_point(
        &test,
        request(Method::GET, "/health").header(header::AUTHORIZATION, "Basic ???"),
    )
    .await;
}

#[tokio::test]
async fn test_entry_point_response_carries_security_headers() {
    let test = TestGate::new(false);
    let response = test.send(empty(request(Method::GET, "/api/me"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
}
