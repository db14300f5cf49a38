//! Basic credentials are tried before tokens and checked with bcrypt.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_valid_basic_credentials() {
    let test = TestGate::new(false);
    let response = test
        .send(empty(
            request(Method::GET, "/api/me")
                .header(header::AUTHORIZATION, basic(BASIC_USERNAME, BASIC_PASSWORD)),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, BASIC_USERNAME);
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let test = TestGate::new(false);

    let unknown = test
        .send(empty(
            request(Method::GET, "/api/me").header(header::AUTHORIZATION, basic("nobody", BASIC_PASSWORD)),
        ))
        .await;
    let wrong = test
        .send(empty(
            request(Method::GET, "/api/me").header(header::AUTHORIZATION, basic(BASIC_USERNAME, "nope")),
        ))
        .await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(unknown).await, body_string(wrong).await);
}

#[tokio::test]
async fn test_basic_credentials_without_configured_user() {
    let test = TestGate::token_only();
    let response = test
        .send(empty(
            request(Method::GET, "/health")
                .header(header::AUTHORIZATION, basic(BASIC_USERNAME, BASIC_PASSWORD)),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_only_gate_still_accepts_tokens() {
    let test = TestGate::token_only();
    let response = test
        .send(empty(request(Method::GET, "/api/me").header(header::AUTHORIZATION, bearer("abc"))))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}
