// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and sign-up flows.

use axum::http::{Method, StatusCode};
use profile_api::error::AppError;
use profile_api::identity::MagicLink;
use profile_api::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_unknown_email_signs_up_and_redirects_to_profile() {
    let app = common::create_test_app();

    let outcome = app
        .state
        .auth_service
        .sign_in_or_sign_up("new@example.com")
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.redirect_to, "http://localhost:5173/profile/");

    let users = {
        use profile_api::identity::IdentityProvider;
        app.identity.list_users().await.unwrap()
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].roles, Some(vec![Role::User]));

    let local = app.store.user(&users[0].id).unwrap();
    assert_eq!(local.email, "new@example.com");
    assert_eq!(local.roles, vec![Role::User]);

    assert_eq!(
        app.identity.magic_links(),
        vec![MagicLink {
            email: "new@example.com".to_string(),
            redirect_to: "http://localhost:5173/profile/".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_known_email_sends_link_without_creating() {
    let app = common::create_test_app();
    app.identity.insert_user("u1", "amy@example.com", Some(vec![Role::User]));
    app.store.insert_user("u1", "amy@example.com", vec![Role::User]);

    let outcome = app
        .state
        .auth_service
        .sign_in_or_sign_up("AMY@example.com")
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.redirect_to, "http://localhost:5173");
    assert_eq!(app.identity.write_attempts(), 0);
    assert_eq!(app.identity.magic_links().len(), 1);
}

#[tokio::test]
async fn test_login_route_sends_magic_link() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "new@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["sent"], true);
    assert_eq!(app.identity.magic_links().len(), 1);
}

#[tokio::test]
async fn test_login_route_rejects_invalid_email() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(common::request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nope" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.identity.magic_links().is_empty());
}

#[tokio::test]
async fn test_sign_up_provider_failure_is_sign_in_failed() {
    let app = common::create_test_app();
    app.identity.fail_writes(true);

    let result = app
        .state
        .auth_service
        .sign_in_or_sign_up("new@example.com")
        .await;

    match result {
        Err(AppError::SignInFailed(msg)) => {
            assert_eq!(msg, "user with email new@example.com was unable to sign in")
        }
        other => panic!("expected SignInFailed, got {:?}", other),
    }
    assert!(app.identity.magic_links().is_empty());
}

#[tokio::test]
async fn test_sign_up_survives_local_write_failure_and_retry_mirrors() {
    let app = common::create_test_app();
    app.store.fail_writes(true);

    let outcome = app
        .state
        .auth_service
        .sign_in_or_sign_up("new@example.com")
        .await
        .unwrap();
    assert!(outcome.created);
    assert_eq!(app.identity.magic_links().len(), 1);
    assert_eq!(app.store.writes(), 0);

    app.store.fail_writes(false);

    let outcome = app
        .state
        .auth_service
        .sign_in_or_sign_up("new@example.com")
        .await
        .unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.redirect_to, "http://localhost:5173/profile/");
    assert_eq!(app.identity.magic_links().len(), 2);

    let identity = app.identity.user("user-1").unwrap();
    let local = app.store.user(&identity.id).unwrap();
    assert_eq!(local.email, "new@example.com");
    assert_eq!(local.roles, vec![Role::User]);
}

#[tokio::test]
async fn test_provider_only_account_is_mirrored_on_sign_in() {
    let app = common::create_test_app();
    app.identity.insert_user("u1", "amy@example.com", Some(vec![Role::User]));

    let outcome = app
        .state
        .auth_service
        .sign_in_or_sign_up("amy@example.com")
        .await
        .unwrap();
    assert!(!outcome.created);
    assert_eq!(app.identity.magic_links().len(), 1);

    let local = app.store.user("u1").unwrap();
    assert_eq!(local.roles, vec![Role::User]);
}

#[tokio::test]
async fn test_password_login() {
    let app = common::create_test_app();
    app.identity.insert_user("u1", "amy@example.com", Some(vec![Role::User]));
    app.identity.set_password("amy@example.com", "hunter2");

    let response = app
        .router
        .clone()
        .oneshot(common::request(
            Method::POST,
            "/auth/login-password",
            None,
            Some(json!({ "email": "amy@example.com", "password": "hunter2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await["accessToken"],
        "memory-token-u1"
    );

    let response = app
        .router
        .oneshot(common::request(
            Method::POST,
            "/auth/login-password",
            None,
            Some(json!({ "email": "amy@example.com", "password": "wrong" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "sign_in_failed");
    assert_eq!(
        body["details"],
        "user with email amy@example.com was unable to sign in"
    );
}
