/// Issue tracker endpoints
///
/// `GET /v1/projects/:id/issues?status=open` filters by status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use projecthub_shared::gateway::issues::{self, NewIssue};
use projecthub_shared::models::issue::{Issue, IssuePriority, IssueStatus, UpdateIssue};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, QueryParams, ValidJson},
};

#[derive(Debug, Default, Deserialize)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIssueRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub priority: Option<IssuePriority>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIssueRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
}

pub async fn list_issues(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    QueryParams(filter): QueryParams<IssueFilter>,
) -> ApiResult<Json<Vec<Issue>>> {
    let issues = issues::list(&state.db, &principal, project_id, filter.status).await?;
    Ok(Json(issues))
}

pub async fn create_issue(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    ValidJson(req): ValidJson<CreateIssueRequest>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let issue = issues::create(
        &state.db,
        &principal,
        project_id,
        NewIssue {
            title: req.title,
            description: req.description,
            priority: req.priority,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Issue>> {
    Ok(Json(
        issues::get(&state.db, &principal, project_id, issue_id).await?,
    ))
}

/// Setting `status` to `closed` stamps `closed_at`; reopening clears it
pub async fn update_issue(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<UpdateIssueRequest>,
) -> ApiResult<Json<Issue>> {
    let changes = UpdateIssue {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
    };

    let issue = issues::update(&state.db, &principal, project_id, issue_id, changes).await?;
    Ok(Json(issue))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    issues::delete(&state.db, &principal, project_id, issue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
