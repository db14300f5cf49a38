//! Plaintext requests are redirected when https is required.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_plaintext_redirected_never_served() {
    let test = TestGate::new(true);

    for (method, path) in [
        (Method::GET, "/health"),
        (Method::GET, "/api/me"),
        (Method::POST, "/api/team/abc/thought"),
        (Method::GET, "/h2-console"),
        (Method::GET, "/does/not/exist"),
    ] {
        let response = test
            .send(empty(request(method, path).header(header::AUTHORIZATION, bearer("abc"))))
            .await;

        assert_eq!(response.status(), StatusCode::FOUND, "{path}");
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("https://{HOST}{path}").as_str()
        );
    }
}

#[tokio::test]
async fn test_redirect_keeps_query() {
    let test = TestGate::new(true);
    let response = test.send(empty(request(Method::GET, "/api/team/abc?sort=desc"))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://retro.example.com/api/team/abc?sort=desc"
    );
}

#[tokio::test]
async fn test_redirect_happens_before_authentication() {
    let test = TestGate::new(true);
    let response = test
        .send(empty(
            request(Method::GET, "/api/me").header(header::AUTHORIZATION, basic("admin", "wrong")),
        ))
        .await;

    // Bad basic credentials would answer 401 if authentication ran first.
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_forwarded_https_is_served() {
    let test = TestGate::new(true);
    let response = test
        .send(empty(request(Method::GET, "/health").header("x-forwarded-proto", "https")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::STRICT_TRANSPORT_SECURITY],
        "max-age=31536000 ; includeSubDomains"
    );
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_plaintext_served_when_https_not_required() {
    let test = TestGate::new(false);
    let response = test.send(empty(request(Method::GET, "/health"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::STRICT_TRANSPORT_SECURITY));
}
