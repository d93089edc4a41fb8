//! Project lifecycle: create, list, read, edit, visibility and deletion

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{optional_bounded_text, optional_required_text, DESCRIPTION_MAX, TITLE_MAX};
use crate::auth::authorization::{authorize, effective_role, EffectiveRole, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::CoreResult;
use crate::models::activity::ActivityEntry;
use crate::models::membership::{MemberRole, Membership};
use crate::models::project::{CreateProject, Project, UpdateProject, Visibility};
use crate::storage::{project_prefix, BlobStore};

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
}

/// A project as seen by one caller
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub role: EffectiveRole,
}

/// Creates the project and its owner membership atomically
pub async fn create(
    pool: &PgPool,
    principal: &Principal,
    input: NewProject,
) -> CoreResult<ProjectView> {
    let title = super::required_text("title", &input.title, TITLE_MAX)?;
    let description = optional_bounded_text("description", input.description, DESCRIPTION_MAX)?
        .unwrap_or_default();
    let visibility = Visibility::from_public_flag(input.is_public);

    let mut tx = pool.begin().await?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            owner_id: principal.user_id,
            title,
            description,
            visibility,
        },
    )
    .await?;
    Membership::create(&mut *tx, project.id, principal.user_id, MemberRole::Owner).await?;
    ActivityEntry::record(
        &mut *tx,
        project.id,
        principal.user_id,
        "project.created",
        Some(project.id),
        json!({ "title": project.title, "visibility": visibility }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project.id, owner_id = %principal.user_id, "Project created");
    Ok(ProjectView {
        project,
        role: EffectiveRole::Owner,
    })
}

/// Projects the caller belongs to plus all public ones; admins see everything
pub async fn list_visible(pool: &PgPool, principal: &Principal) -> CoreResult<Vec<ProjectView>> {
    let rows = if principal.is_admin() {
        Project::list_all_for(pool, principal.user_id).await?
    } else {
        Project::list_visible_to(pool, principal.user_id).await?
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let role = effective_role(principal, row.member_role, row.project.visibility);
            ProjectView {
                project: row.project,
                role,
            }
        })
        .collect())
}

pub async fn get(pool: &PgPool, principal: &Principal, project_id: Uuid) -> CoreResult<ProjectView> {
    let mut conn = pool.acquire().await?;
    let grant = authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Ok(ProjectView {
        project: grant.project,
        role: grant.role,
    })
}

pub async fn update_details(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    title: Option<String>,
    description: Option<String>,
) -> CoreResult<ProjectView> {
    let update = UpdateProject {
        title: optional_required_text("title", title, TITLE_MAX)?,
        description: optional_bounded_text("description", description, DESCRIPTION_MAX)?,
    };

    let mut tx = pool.begin().await?;
    let grant = authorize(&mut tx, principal, project_id, ProjectAction::ManageProject).await?;

    let details = json!({
        "title": update.title.is_some(),
        "description": update.description.is_some(),
    });
    let project = Project::update(&mut *tx, project_id, update)
        .await?
        .unwrap_or(grant.project);
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "project.updated",
        Some(project_id),
        json!({ "changed": details }),
    )
    .await?;

    tx.commit().await?;

    Ok(ProjectView {
        project,
        role: grant.role,
    })
}

/// Makes the project public or private (owner only)
pub async fn set_visibility(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    is_public: bool,
) -> CoreResult<ProjectView> {
    let visibility = Visibility::from_public_flag(is_public);

    let mut tx = pool.begin().await?;
    let grant = authorize(&mut tx, principal, project_id, ProjectAction::ManageProject).await?;

    let project = Project::set_visibility(&mut *tx, project_id, visibility)
        .await?
        .unwrap_or(grant.project);
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "project.visibility_changed",
        Some(project_id),
        json!({ "visibility": visibility }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, ?visibility, "Project visibility changed");
    Ok(ProjectView {
        project,
        role: grant.role,
    })
}

/// Deletes the project and everything in it, then purges its blobs
///
/// Blob purge happens after commit; a failure there is logged and leaves
/// orphaned bytes rather than failing the request.
pub async fn delete(
    pool: &PgPool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    project_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageProject).await?;
    Project::delete(&mut *tx, project_id).await?;
    tx.commit().await?;

    if let Err(e) = blobs.delete_prefix(&project_prefix(project_id)).await {
        warn!(project_id = %project_id, error = %e, "Failed to purge project blobs");
    }

    info!(project_id = %project_id, actor_id = %principal.user_id, "Project deleted");
    Ok(())
}
