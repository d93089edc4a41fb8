//! Issue tracker

use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    optional_bounded_text, optional_required_text, required_text, DESCRIPTION_MAX, TITLE_MAX,
};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::activity::ActivityEntry;
use crate::models::issue::{CreateIssue, Issue, IssuePriority, IssueStatus, UpdateIssue};

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<IssuePriority>,
}

pub async fn list(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    status: Option<IssueStatus>,
) -> CoreResult<Vec<Issue>> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Ok(Issue::list_by_project(&mut *conn, project_id, status).await?)
}

pub async fn get(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
) -> CoreResult<Issue> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Issue::find_in_project(&mut *conn, project_id, issue_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Issue {} not found", issue_id)))
}

pub async fn create(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    input: NewIssue,
) -> CoreResult<Issue> {
    let title = required_text("title", &input.title, TITLE_MAX)?;
    let description = optional_bounded_text("description", input.description, DESCRIPTION_MAX)?
        .unwrap_or_default();

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    let issue = Issue::create(
        &mut *tx,
        CreateIssue {
            project_id,
            title,
            description,
            priority: input.priority.unwrap_or_default(),
            reporter_id: principal.user_id,
        },
    )
    .await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "issue.created",
        Some(issue.id),
        json!({ "title": issue.title, "priority": issue.priority }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, issue_id = %issue.id, "Issue created");
    Ok(issue)
}

/// Partial update; setting status to `closed` stamps `closed_at`
pub async fn update(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
    mut changes: UpdateIssue,
) -> CoreResult<Issue> {
    changes.title = optional_required_text("title", changes.title, TITLE_MAX)?;
    changes.description =
        optional_bounded_text("description", changes.description, DESCRIPTION_MAX)?;

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    let action = match changes.status {
        Some(IssueStatus::Closed) => "issue.closed",
        Some(_) => "issue.status_changed",
        None => "issue.updated",
    };
    let issue = Issue::update(&mut *tx, project_id, issue_id, changes)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Issue {} not found", issue_id)))?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        action,
        Some(issue.id),
        json!({ "status": issue.status, "priority": issue.priority }),
    )
    .await?;

    tx.commit().await?;

    Ok(issue)
}

/// Deletes the issue along with its comments
pub async fn delete(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    if !Issue::delete(&mut *tx, project_id, issue_id).await? {
        return Err(CoreError::not_found(format!("Issue {} not found", issue_id)));
    }
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "issue.deleted",
        Some(issue_id),
        json!({}),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, issue_id = %issue_id, "Issue deleted");
    Ok(())
}
