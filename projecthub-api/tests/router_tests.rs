/// Router behaviour that is decided before any database access
///
/// These run without PostgreSQL: the router is built over a lazy pool
/// pointed at a closed port.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{json_request, multipart_request, offline_app, send, token_for, JWT_SECRET};
use projecthub_shared::auth::jwt::{create_token, Claims, TokenType};
use projecthub_shared::models::user::GlobalRole;
use serde_json::json;
use uuid::Uuid;

fn detail_fields(body: &serde_json::Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = offline_app();

    let response = send(&app, json_request(Method::GET, "/health", None, None)).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = offline_app();

    let response = send(&app, json_request(Method::GET, "/v1/projects", None, None)).await;

    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        response.headers.get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert!(response.headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = offline_app();
    let project = Uuid::new_v4();

    for uri in [
        "/v1/me".to_string(),
        "/v1/projects".to_string(),
        format!("/v1/projects/{}/tasks", project),
        format!("/v1/projects/{}/access?action=view", project),
        "/v1/admin/users".to_string(),
    ] {
        let response = send(&app, json_request(Method::GET, &uri, None, None)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.json()["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer() {
    let app = offline_app();
    let refresh = create_token(
        &Claims::new(Uuid::new_v4(), GlobalRole::Student, TokenType::Refresh),
        JWT_SECRET,
    )
    .unwrap();

    let response = send(&app, json_request(Method::GET, "/v1/me", Some(&refresh), None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = offline_app();
    let forged = create_token(
        &Claims::new(Uuid::new_v4(), GlobalRole::Admin, TokenType::Access),
        "some-other-secret-that-is-long-enough",
    )
    .unwrap();

    let response = send(
        &app,
        json_request(Method::GET, "/v1/admin/users", Some(&forged), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_details() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({"username": "ab", "email": "not-an-email", "password": "SecureP@ss123"})),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_fields(&body), vec!["email", "username"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = offline_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "bad_request");
}

#[tokio::test]
async fn test_missing_json_field_is_validation_error() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({"username": "ada"})),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&response.json()), vec!["body"]);
}

#[tokio::test]
async fn test_unknown_access_action_rejected() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), GlobalRole::Student);
    let uri = format!("/v1/projects/{}/access?action=teleport", Uuid::new_v4());

    let response = send(&app, json_request(Method::GET, &uri, Some(&token), None)).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&response.json()), vec!["action"]);
}

#[tokio::test]
async fn test_negative_task_position_rejected() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), GlobalRole::Student);
    let uri = format!("/v1/projects/{}/tasks/{}", Uuid::new_v4(), Uuid::new_v4());

    let response = send(
        &app,
        json_request(Method::PATCH, &uri, Some(&token), Some(json!({"position": -3}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&response.json()), vec!["position"]);
}

#[tokio::test]
async fn test_unknown_issue_status_filter_is_bad_request() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), GlobalRole::Student);
    let uri = format!("/v1/projects/{}/issues?status=resolved", Uuid::new_v4());

    let response = send(&app, json_request(Method::GET, &uri, Some(&token), None)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "bad_request");
}

#[tokio::test]
async fn test_upload_requires_multipart() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), GlobalRole::Student);
    let uri = format!("/v1/projects/{}/files", Uuid::new_v4());

    let response = send(
        &app,
        json_request(Method::POST, &uri, Some(&token), Some(json!({"file": "x"}))),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4(), GlobalRole::Student);
    let uri = format!("/v1/projects/{}/files", Uuid::new_v4());

    let response = send(
        &app,
        multipart_request(&uri, &token, &[("note", None, b"hello".as_slice())]),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&response.json()), vec!["file"]);
}
