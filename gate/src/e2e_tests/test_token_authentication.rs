//! Bearer tokens authenticate the principal handed to the operations.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_valid_token_identifies_principal() {
    let test = TestGate::new(false);
    let response = test
        .send(empty(request(Method::GET, "/api/me").header(header::AUTHORIZATION, bearer("team-42"))))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "team-42");
}

#[tokio::test]
async fn test_token_owner_reaches_team() {
    let test = TestGate::new(false);
    let response = test
        .send(empty(
            request(Method::GET, "/api/team/team-42").header(header::AUTHORIZATION, bearer("team-42")),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "team team-42");
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    let test = TestGate::new(false);
    let expired = crate::auth::jwt::tests::create_token(
        jsonwebtoken::Algorithm::HS512,
        "team-42",
        SECRET.as_bytes(),
        jsonwebtoken::get_current_timestamp() - 3600,
    );
    let response = test
        .send(empty(
            request(Method::GET, "/api/me").header(header::AUTHORIZATION, format!("Bearer {expired}")),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let test = TestGate::new(false);
    let token = bearer("team-42").replacen("Bearer", "bearer", 1);
    let response = test
        .send(empty(request(Method::GET, "/api/me").header(header::AUTHORIZATION, token)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}
