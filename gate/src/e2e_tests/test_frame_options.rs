//! Only the database console may be framed, and only by its own origin.

use axum::http::{Method, StatusCode, header};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_console_allows_same_origin_framing() {
    let test = TestGate::new(false);

    for path in ["/h2-console", "/h2-console/login.do", "/h2-console/query.jsp"] {
        let response = test.send(empty(request(Method::GET, path))).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "SAMEORIGIN", "{path}");
    }
}

#[tokio::test]
async fn test_other_routes_deny_framing() {
    let test = TestGate::new(false);

    for path in ["/health", "/api/me", "/api/team/abc", "/no/such/route"] {
        let response = test
            .send(empty(request(Method::GET, path).header(header::AUTHORIZATION, bearer("abc"))))
            .await;
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY", "{path}");
    }
}

#[tokio::test]
async fn test_default_cache_and_sniffing_headers() {
    let test = TestGate::new(false);
    let response = test.send(empty(request(Method::GET, "/health"))).await;

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, max-age=0, must-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
}
