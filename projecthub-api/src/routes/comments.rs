/// Issue comment endpoints
///
/// Anyone who can view the project can comment. Closed issues take no new
/// comments (`422` on `issue`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use projecthub_shared::gateway::comments;
use projecthub_shared::models::comment::{Comment, CommentView};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub body: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = comments::list(&state.db, &principal, project_id, issue_id).await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = comments::add(&state.db, &principal, project_id, issue_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, issue_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    comments::delete(&state.db, &principal, project_id, issue_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
