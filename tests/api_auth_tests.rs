// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept bearer and cookie tokens
//! 3. CORS preflight requests return correct headers
//! 4. Security headers are set on every response

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use profile_api::middleware::auth::ACCESS_TOKEN_COOKIE;
use profile_api::models::Role;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(Method::GET, "/user/whoami", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(
            Method::GET,
            "/user/whoami",
            Some("invalid.token.here"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let app = common::create_test_app();
    app.store.insert_user("u1", "u1@example.com", vec![Role::User]);
    let token = common::create_test_jwt("u1");

    let response = app
        .router
        .oneshot(common::request(Method::GET, "/user/whoami", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_with_cookie_token() {
    let app = common::create_test_app();
    app.store.insert_user("u1", "u1@example.com", vec![Role::User]);
    let token = common::create_test_jwt("u1");

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/user/whoami")
                .header(header::COOKIE, format!("{}={}", ACCESS_TOKEN_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let app = common::create_test_app();
    app.store.insert_user("u1", "u1@example.com", vec![Role::User]);
    let token = common::create_test_jwt_with(
        "u1",
        "anon",
        &app.state.config.jwt_secret,
    );

    let response = app
        .router
        .oneshot(common::request(Method::GET, "/user/whoami", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/profile")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(Method::GET, "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body.get("buildId").is_some());
}

#[tokio::test]
async fn test_security_headers_on_errors() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(Method::GET, "/admin/users", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");
}
