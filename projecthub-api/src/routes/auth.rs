/// Authentication endpoints
///
/// - `POST /v1/auth/register` - create an account and sign in
/// - `POST /v1/auth/login` - sign in with username or email
/// - `POST /v1/auth/refresh` - exchange a refresh token for an access token

use axum::{extract::State, http::StatusCode, Json};
use projecthub_shared::gateway::accounts::{self, NewAccount, Session};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{app::AppState, error::ApiResult, extract::ValidJson};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength rules are applied by the account gateway
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "username", alias = "email")]
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Register a new account
///
/// ```text
/// POST /v1/auth/register
/// {"username": "ada", "email": "ada@example.com", "password": "SecureP@ss123"}
/// ```
///
/// Responds `201` with `{user, access_token, refresh_token}`. A taken
/// username or email is `409`.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = accounts::register(
        &state.db,
        state.jwt_secret(),
        NewAccount {
            username: req.username,
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Sign in; wrong password and unknown account are both `401`
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let session =
        accounts::login(&state.db, state.jwt_secret(), &req.identifier, &req.password).await?;

    Ok(Json(session))
}

/// New access token carrying the user's current global role
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = accounts::refresh(&state.db, state.jwt_secret(), &req.refresh_token).await?;

    Ok(Json(RefreshResponse { access_token }))
}
