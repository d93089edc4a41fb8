/// Site administration (global `admin` role only)
///
/// - `GET /v1/admin/users?limit=&offset=`
/// - `PATCH /v1/admin/users/:id/role` - `{"role": "admin" | "student"}`
/// - `DELETE /v1/admin/users/:id`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use projecthub_shared::gateway::accounts::{self, UserPage};
use projecthub_shared::models::user::{GlobalRole, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, JsonBody, QueryParams},
};

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: GlobalRole,
}

pub async fn list_users(
    State(state): State<AppState>,
    Auth(principal): Auth,
    QueryParams(page): QueryParams<Pagination>,
) -> ApiResult<Json<UserPage>> {
    let users = accounts::list_users(
        &state.db,
        &principal,
        page.limit.unwrap_or(DEFAULT_LIMIT),
        page.offset.unwrap_or(0),
    )
    .await?;

    Ok(Json(users))
}

pub async fn set_user_role(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(user_id): Path<Uuid>,
    JsonBody(req): JsonBody<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    let user = accounts::set_global_role(&state.db, &principal, user_id, req.role).await?;
    Ok(Json(user))
}

/// Projects owned by the user are deleted with it
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    accounts::delete_user(&state.db, state.blobs.as_ref(), &principal, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
