//! State-changing requests are never asked for a CSRF token.

use axum::body::Body;
use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_post_without_csrf_token_reaches_authentication() {
    let test = TestGate::new(false);

    // Anonymous: the gate admits it and the operation asks for authentication.
    let anonymous = test
        .send(empty(request(Method::POST, "/api/team/abc/thought")))
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    // Authenticated: no token or header beyond the bearer is needed.
    let authenticated = test
        .send(
            request(Method::POST, "/api/team/abc/thought")
                .header(header::AUTHORIZATION, bearer("abc"))
                .header(header::CONTENT_TYPE, "text/plain")
                .header(header::ORIGIN, "https://evil.example.net")
                .body(Body::from("we should pair more"))
                .expect("valid request"),
        )
        .await;
    assert_eq!(authenticated.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_post_with_basic_credentials_without_csrf_token() {
    let test = TestGate::new(false);
    let response = test
        .send(empty(
            request(Method::POST, "/api/team/admin/thought")
                .header(header::AUTHORIZATION, basic(BASIC_USERNAME, BASIC_PASSWORD)),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}
