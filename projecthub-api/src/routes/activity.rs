/// `GET /v1/projects/:id/activity?before=<id>&limit=<n>`
///
/// Newest first. Pass the smallest `id` of a page as `before` to fetch the
/// next one.

use axum::{
    extract::{Path, State},
    Json,
};
use projecthub_shared::gateway::activity;
use projecthub_shared::models::activity::ActivityEntry;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, QueryParams},
};

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub before: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_activity(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    QueryParams(query): QueryParams<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    let entries =
        activity::list(&state.db, &principal, project_id, query.before, query.limit).await?;

    Ok(Json(entries))
}
