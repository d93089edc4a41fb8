/// Project membership endpoints
///
/// Listing needs `View`; adding, re-roling and removing others need
/// `ManageMembers`. Any member may remove themselves (leave).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use projecthub_shared::gateway::members;
use projecthub_shared::models::membership::{Member, MemberRole, Membership};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, JsonBody, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,

    /// `editor` or `viewer`
    pub role: MemberRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

pub async fn list_members(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Member>>> {
    Ok(Json(members::list(&state.db, &principal, project_id).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    ValidJson(req): ValidJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let membership =
        members::add(&state.db, &principal, project_id, &req.username, req.role).await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    JsonBody(req): JsonBody<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let membership =
        members::update_role(&state.db, &principal, project_id, user_id, req.role).await?;

    Ok(Json(membership))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    members::remove(&state.db, &principal, project_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
