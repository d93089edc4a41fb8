/// The caller's own account
///
/// - `GET /v1/me`
/// - `PATCH /v1/me` - change email and/or display name (`null` clears it)
/// - `POST /v1/me/password`

use axum::{extract::State, http::StatusCode, Json};
use projecthub_shared::gateway::accounts::{self, ProfileUpdate};
use projecthub_shared::models::user::User;
use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub display_name: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<User>> {
    Ok(Json(accounts::profile(&state.db, &principal).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = accounts::update_profile(
        &state.db,
        &principal,
        ProfileUpdate {
            email: req.email,
            display_name: req.display_name,
        },
    )
    .await?;

    Ok(Json(user))
}

/// Responds `204`; a wrong current password is `422` on `current_password`
pub async fn change_password(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    accounts::change_password(
        &state.db,
        &principal,
        &req.current_password,
        &req.new_password,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
