//! Common test utilities for integration tests
//!
//! - [`offline_app`] builds the full router over a lazy pool that never
//!   connects, for exercising everything that is decided before the
//!   database is touched (authentication, validation, headers).
//! - [`TestContext`] builds the router over a real database when
//!   `DATABASE_URL` is set and offers request/registration helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use projecthub_api::app::{build_router, AppState};
use projecthub_api::config::Config;
use projecthub_shared::auth::jwt::{create_token, Claims, TokenType};
use projecthub_shared::db::migrations::run_migrations;
use projecthub_shared::db::pool::{create_lazy_pool, create_pool, DatabaseConfig};
use projecthub_shared::models::user::GlobalRole;
use projecthub_shared::storage::MemoryBlobStore;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const MAX_UPLOAD_BYTES: usize = 4096;
pub const PASSWORD: &str = "SecureP@ss123";

pub fn test_config(database_url: &str) -> Config {
    let vars: HashMap<String, String> = [
        ("DATABASE_URL", database_url),
        ("DATABASE_MAX_CONNECTIONS", "5"),
        ("JWT_SECRET", JWT_SECRET),
        ("MAX_UPLOAD_BYTES", "4096"),
        ("FILE_STORAGE_DIR", "unused"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Config::from_vars(vars).expect("test config is valid")
}

/// Router over a pool pointed at a closed port
pub fn offline_app() -> Router {
    let config = test_config("postgresql://projecthub@127.0.0.1:1/offline");
    let pool = create_lazy_pool(&DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: 1,
        min_connections: 0,
        acquire_timeout_seconds: 1,
        ..Default::default()
    })
    .expect("lazy pool never connects up front");

    build_router(AppState::new(pool, config, Arc::new(MemoryBlobStore::new())))
}

/// Access token for a user that need not exist
pub fn token_for(user_id: Uuid, role: GlobalRole) -> String {
    let claims = Claims::new(user_id, role, TokenType::Access);
    create_token(&claims, JWT_SECRET).expect("token signs")
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds")
}

/// Multipart body with one part per `(name, filename, bytes)`
pub fn multipart_request(
    uri: &str,
    token: &str,
    parts: &[(&str, Option<&str>, &[u8])],
) -> Request<Body> {
    const BOUNDARY: &str = "projecthub-test-boundary";

    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request builds")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            panic!(
                "{} body is not JSON: {}",
                self.status,
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");

    TestResponse {
        status,
        headers,
        body,
    }
}

/// A registered account and its access token
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
    pub refresh_token: String,
}

/// Router over a migrated database
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestContext {
    /// `None` when `DATABASE_URL` is unset
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping");
            return None;
        };

        let config = test_config(&url);
        let db = create_pool(DatabaseConfig::new(url, 5))
            .await
            .expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Failed to run migrations");

        let blobs = Arc::new(MemoryBlobStore::new());
        let app = build_router(AppState::new(db.clone(), config, blobs.clone()));

        Some(Self { db, app, blobs })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        send(&self.app, json_request(method, uri, token, body)).await
    }

    pub async fn register(&self) -> TestUser {
        let tag = Uuid::new_v4().simple().to_string();
        let username = format!("t_{}", &tag[..12]);

        let response = self
            .request(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", tag),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());

        let body = response.json();
        TestUser {
            id: body["user"]["id"]
                .as_str()
                .and_then(|id| id.parse().ok())
                .expect("user id in session"),
            username,
            token: body["access_token"].as_str().expect("access token").to_string(),
            refresh_token: body["refresh_token"]
                .as_str()
                .expect("refresh token")
                .to_string(),
        }
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn create_project(&self, owner: &TestUser, is_public: bool) -> String {
        let response = self
            .request(
                Method::POST,
                "/v1/projects",
                Some(&owner.token),
                Some(json!({ "title": "Operating systems lab", "is_public": is_public })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());

        response.json()["id"]
            .as_str()
            .expect("project id")
            .to_string()
    }
}
