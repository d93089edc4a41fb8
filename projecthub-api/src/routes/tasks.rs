/// Kanban task endpoints
///
/// `GET /v1/projects/:id/tasks` returns the board grouped by column:
///
/// ```json
/// {"todo": [...], "in_progress": [...], "done": [...]}
/// ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use projecthub_shared::gateway::tasks::{self, Board, NewTask};
use projecthub_shared::models::task::{Task, TaskStatus, UpdateTask};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{Auth, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Omitted fields are left alone; `null` clears `assignee_id` / `due_date`
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[validate(range(min = 0, message = "Position must not be negative"))]
    pub position: Option<i32>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            position: req.position,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        }
    }
}

pub async fn task_board(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Board>> {
    Ok(Json(tasks::board(&state.db, &principal, project_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create(
        &state.db,
        &principal,
        project_id,
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        tasks::get(&state.db, &principal, project_id, task_id).await?,
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = tasks::update(&state.db, &principal, project_id, task_id, req.into()).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    tasks::delete(&state.db, &principal, project_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
