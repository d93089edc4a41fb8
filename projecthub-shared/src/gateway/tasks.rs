//! Kanban board tasks

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{
    optional_bounded_text, optional_required_text, required_text, DESCRIPTION_MAX, TITLE_MAX,
};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::activity::ActivityEntry;
use crate::models::membership::Membership;
use crate::models::task::{CreateTask, Task, TaskStatus, UpdateTask};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Tasks grouped by column, each column ordered by position
#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl Board {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Board::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => board.todo.push(task),
                TaskStatus::InProgress => board.in_progress.push(task),
                TaskStatus::Done => board.done.push(task),
            }
        }
        for column in [&mut board.todo, &mut board.in_progress, &mut board.done] {
            column.sort_by_key(|t| (t.position, t.created_at));
        }
        board
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn ensure_assignable(
    conn: &mut PgConnection,
    project_id: Uuid,
    assignee_id: Uuid,
) -> CoreResult<()> {
    if Membership::get_role(conn, project_id, assignee_id)
        .await?
        .is_none()
    {
        return Err(CoreError::validation(
            "assignee_id",
            "Assignee must be a member of the project",
        ));
    }
    Ok(())
}

/// The whole board; a caller with no access gets `Forbidden`, never an
/// empty board
pub async fn board(pool: &PgPool, principal: &Principal, project_id: Uuid) -> CoreResult<Board> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    let tasks = Task::list_by_project(&mut *conn, project_id).await?;
    Ok(Board::from_tasks(tasks))
}

pub async fn get(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    task_id: Uuid,
) -> CoreResult<Task> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Task::find_in_project(&mut *conn, project_id, task_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Task {} not found", task_id)))
}

pub async fn create(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    input: NewTask,
) -> CoreResult<Task> {
    let title = required_text("title", &input.title, TITLE_MAX)?;
    let description = optional_bounded_text("description", input.description, DESCRIPTION_MAX)?
        .unwrap_or_default();

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    if let Some(assignee_id) = input.assignee_id {
        ensure_assignable(&mut tx, project_id, assignee_id).await?;
    }

    let task = Task::create(
        &mut *tx,
        CreateTask {
            project_id,
            title,
            description,
            status: input.status.unwrap_or(TaskStatus::Todo),
            assignee_id: input.assignee_id,
            due_date: input.due_date,
            created_by: principal.user_id,
        },
    )
    .await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "task.created",
        Some(task.id),
        json!({ "title": task.title, "status": task.status }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, task_id = %task.id, "Task created");
    Ok(task)
}

pub async fn update(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    task_id: Uuid,
    mut changes: UpdateTask,
) -> CoreResult<Task> {
    changes.title = optional_required_text("title", changes.title, TITLE_MAX)?;
    changes.description =
        optional_bounded_text("description", changes.description, DESCRIPTION_MAX)?;
    if matches!(changes.position, Some(p) if p < 0) {
        return Err(CoreError::validation("position", "Position must not be negative"));
    }

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    if let Some(Some(assignee_id)) = changes.assignee_id {
        ensure_assignable(&mut tx, project_id, assignee_id).await?;
    }

    let status_change = changes.status;
    let task = Task::update(&mut *tx, project_id, task_id, changes)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Task {} not found", task_id)))?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        if status_change.is_some() { "task.moved" } else { "task.updated" },
        Some(task.id),
        json!({ "status": task.status, "position": task.position }),
    )
    .await?;

    tx.commit().await?;

    Ok(task)
}

pub async fn delete(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    task_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    if !Task::delete(&mut *tx, project_id, task_id).await? {
        return Err(CoreError::not_found(format!("Task {} not found", task_id)));
    }
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "task.deleted",
        Some(task_id),
        json!({}),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, task_id = %task_id, "Task deleted");
    Ok(())
}
