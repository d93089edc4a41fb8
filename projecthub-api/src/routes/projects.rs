/// Project endpoints
///
/// ```text
/// GET    /v1/projects                 projects the caller can see
/// POST   /v1/projects                 create (caller becomes owner)
/// GET    /v1/projects/:id             read (View)
/// PATCH  /v1/projects/:id             edit title/description (owner)
/// DELETE /v1/projects/:id             delete with all content (owner)
/// PUT    /v1/projects/:id/visibility  public/private (owner)
/// GET    /v1/projects/:id/access      evaluate one action for the caller
/// ```

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use projecthub_shared::auth::authorization::{evaluate_access, EffectiveRole, ProjectAction};
use projecthub_shared::gateway::projects::{self, NewProject, ProjectView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Auth, JsonBody, QueryParams, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetVisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    /// Defaults to `view`
    pub action: Option<String>,
}

/// Granted access; a denied action is answered with 403 instead
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub project_id: Uuid,
    pub action: String,
    pub role: EffectiveRole,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<Vec<ProjectView>>> {
    Ok(Json(projects::list_visible(&state.db, &principal).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ValidJson(req): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    let project = projects::create(
        &state.db,
        &principal,
        NewProject {
            title: req.title,
            description: req.description,
            is_public: req.is_public,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectView>> {
    Ok(Json(projects::get(&state.db, &principal, project_id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    let project =
        projects::update_details(&state.db, &principal, project_id, req.title, req.description)
            .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    projects::delete(&state.db, state.blobs.as_ref(), &principal, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_visibility(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    JsonBody(req): JsonBody<SetVisibilityRequest>,
) -> ApiResult<Json<ProjectView>> {
    let project =
        projects::set_visibility(&state.db, &principal, project_id, req.is_public).await?;

    Ok(Json(project))
}

/// Evaluates `action` for the presented bearer token
///
/// A permitted action answers `200` with the caller's effective role; a
/// denied one is `403`, an unknown project `404`.
pub async fn check_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    QueryParams(query): QueryParams<AccessQuery>,
) -> ApiResult<Json<AccessResponse>> {
    let action = match query.action.as_deref() {
        None => ProjectAction::View,
        Some(raw) => ProjectAction::parse(raw)
            .ok_or_else(|| ApiError::validation("action", format!("Unknown action: {raw}")))?,
    };

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let role = evaluate_access(&state.db, bearer, state.jwt_secret(), project_id, action).await?;

    Ok(Json(AccessResponse {
        project_id,
        action: action.to_string(),
        role,
    }))
}
