//! The gate and the password encoder are shared across concurrent requests.

use std::sync::Arc;

use axum::http::{Method, StatusCode, header};
use futures::future::join_all;

use crate::auth::PasswordEncoder;
use crate::auth::password::MIN_COST;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let test = Arc::new(TestGate::new(false));

    let requests = (0..16).map(|i| {
        let test = Arc::clone(&test);
        async move {
            let team = format!("team-{i}");
            let builder = if i % 2 == 0 {
                request(Method::GET, "/api/me").header(header::AUTHORIZATION, bearer(&team))
            } else {
                request(Method::GET, "/api/me")
            };
            let response = test.send(empty(builder)).await;
            (i, team, response.status(), body_string(response).await)
        }
    });

    for (i, team, status, body) in join_all(requests).await {
        if i % 2 == 0 {
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, team);
        } else {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_basic_requests_do_not_hold_the_runtime_thread() {
    let test = Arc::new(TestGate::new(false));

    let requests = (0..8).map(|i| {
        let test = Arc::clone(&test);
        async move {
            let builder = if i % 2 == 0 {
                request(Method::GET, "/api/me")
                    .header(header::AUTHORIZATION, basic(BASIC_USERNAME, BASIC_PASSWORD))
            } else {
                request(Method::GET, "/api/me")
                    .header(header::AUTHORIZATION, basic(BASIC_USERNAME, "wrong"))
            };
            (i, test.send(empty(builder)).await.status())
        }
    });

    for (i, status) in join_all(requests).await {
        let expected = if i % 2 == 0 {
            StatusCode::OK
        } else {
            StatusCode::UNAUTHORIZED
        };
        assert_eq!(status, expected, "request {i}");
    }
}

#[tokio::test]
async fn test_encoder_shared_across_tasks() {
    let encoder = PasswordEncoder::new(MIN_COST).expect("valid cost");

    let tasks = (0..8).map(move |i| {
        tokio::task::spawn_blocking(move || {
            let plaintext = format!("password-{i}");
            let digest = encoder.hash(&plaintext).expect("hash succeeds");
            (
                encoder.verify(&plaintext, &digest),
                encoder.verify(&format!("password-{}", i + 1), &digest),
            )
        })
    });

    for result in join_all(tasks).await {
        let (own, other) = result.expect("task completes");
        assert!(own);
        assert!(!other);
    }
}
