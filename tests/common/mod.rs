// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use profile_api::config::Config;
use profile_api::db::InMemoryStore;
use profile_api::identity::InMemoryIdentityProvider;
use profile_api::models::Role;
use profile_api::routes::create_router;
use profile_api::AppState;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if a test database is available via environment variable.
#[allow(dead_code)]
pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        match crate::common::database_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Router plus handles on the in-memory backends behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: InMemoryIdentityProvider,
    pub store: InMemoryStore,
}

/// Create a test app backed by the in-memory provider and store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let identity = InMemoryIdentityProvider::new();
    let store = InMemoryStore::new();

    let state = Arc::new(AppState::new(
        config,
        Arc::new(identity.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
        store,
    }
}

/// Seed a user at the provider and in the local store, with a profile.
#[allow(dead_code)]
pub async fn seed_user_with_profile(app: &TestApp, id: &str, username: &str, roles: Vec<Role>) {
    use profile_api::db::ProfileRepository;
    use profile_api::models::ProfileChanges;

    let email = format!("{}@example.com", id);
    app.identity.insert_user(id, &email, Some(roles.clone()));
    app.store.insert_user(id, &email, roles);
    app.store
        .upsert_profile(
            id,
            Some(&email),
            &ProfileChanges {
                username: username.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                profile_image_src: String::new(),
            },
        )
        .await
        .unwrap();
}

/// Create an access token like the identity provider would issue.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_test_jwt_with(user_id, "authenticated", &Config::test_default().jwt_secret)
}

#[allow(dead_code)]
pub fn create_test_jwt_with(user_id: &str, audience: &str, secret: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
        aud: String,
        email: String,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
        aud: audience.to_string(),
        email: format!("{}@example.com", user_id),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

/// Build a request, optionally authenticated and with a JSON body.
#[allow(dead_code)]
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
