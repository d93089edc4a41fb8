//! Comments on issues
//!
//! Anyone who can view a project can comment on it. A closed issue accepts
//! no new comments whatever the caller's role.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{required_text, COMMENT_MAX};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::activity::ActivityEntry;
use crate::models::comment::{Comment, CommentView};
use crate::models::issue::{Issue, IssueStatus};

fn ensure_open(status: IssueStatus) -> CoreResult<()> {
    if !status.accepts_comments() {
        return Err(CoreError::validation(
            "issue",
            "Cannot comment on a closed issue",
        ));
    }
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
) -> CoreResult<Vec<CommentView>> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    if Issue::find_in_project(&mut *conn, project_id, issue_id)
        .await?
        .is_none()
    {
        return Err(CoreError::not_found(format!("Issue {} not found", issue_id)));
    }

    Ok(Comment::list_for_issue(&mut *conn, project_id, issue_id).await?)
}

pub async fn add(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
    body: &str,
) -> CoreResult<Comment> {
    let body = required_text("body", body, COMMENT_MAX)?;

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::Comment).await?;

    // FOR SHARE keeps the issue from being closed underneath us
    let issue = Issue::lock_in_project(&mut *tx, project_id, issue_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Issue {} not found", issue_id)))?;
    ensure_open(issue.status)?;

    let comment = Comment::create(&mut *tx, project_id, issue_id, principal.user_id, &body).await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "comment.added",
        Some(comment.id),
        json!({ "issue_id": issue_id }),
    )
    .await?;

    tx.commit().await?;

    Ok(comment)
}

/// Authors may delete their own comments; editors and owners may delete any
pub async fn delete(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    issue_id: Uuid,
    comment_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    let grant = authorize(&mut tx, principal, project_id, ProjectAction::View).await?;

    let comment = Comment::find_on_issue(&mut *tx, project_id, issue_id, comment_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("Comment {} not found", comment_id)))?;

    let is_author = comment.author_id == Some(principal.user_id);
    if !is_author && !grant.role.permits(ProjectAction::ManageContent) {
        return Err(CoreError::Forbidden(format!(
            "Role '{}' may only delete its own comments",
            grant.role
        )));
    }

    Comment::delete(&mut *tx, comment.id).await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "comment.deleted",
        Some(comment.id),
        json!({ "issue_id": issue_id }),
    )
    .await?;

    tx.commit().await?;

    Ok(())
}
