//! Project membership management
//!
//! Only the owner (or an admin) manages members. The owner membership itself
//! is immutable: it cannot be removed or re-roled by anyone. Any other member
//! may remove themselves.

use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::{authorize, check, resolve, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::activity::ActivityEntry;
use crate::models::membership::{Member, MemberRole, Membership};
use crate::models::user::User;

fn require_assignable(role: MemberRole) -> CoreResult<()> {
    if !role.is_assignable() {
        return Err(CoreError::validation(
            "role",
            "Role must be 'editor' or 'viewer'",
        ));
    }
    Ok(())
}

fn protect_owner(current: MemberRole) -> CoreResult<()> {
    if current == MemberRole::Owner {
        return Err(CoreError::Forbidden(
            "The project owner's membership cannot be changed".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(pool: &PgPool, principal: &Principal, project_id: Uuid) -> CoreResult<Vec<Member>> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Ok(Membership::list_members(&mut *conn, project_id).await?)
}

/// Invites an existing user by username
pub async fn add(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    username: &str,
    role: MemberRole,
) -> CoreResult<Membership> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageMembers).await?;
    require_assignable(role)?;

    let user = User::find_by_username(&mut *tx, username.trim())
        .await?
        .ok_or_else(|| CoreError::not_found(format!("User '{}' not found", username.trim())))?;

    let membership = Membership::create(&mut *tx, project_id, user.id, role).await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "member.added",
        Some(user.id),
        json!({ "username": user.username, "role": role }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, user_id = %user.id, role = %role, "Member added");
    Ok(membership)
}

pub async fn update_role(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
) -> CoreResult<Membership> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageMembers).await?;
    require_assignable(role)?;

    let current = Membership::lock_role(&mut *tx, project_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Membership not found"))?;
    protect_owner(current)?;

    let membership = Membership::update_role(&mut *tx, project_id, user_id, role)
        .await?
        .ok_or_else(|| CoreError::not_found("Membership not found"))?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "member.role_changed",
        Some(user_id),
        json!({ "from": current, "to": role }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, user_id = %user_id, from = %current, to = %role, "Member role changed");
    Ok(membership)
}

/// Removes a member; a caller removing themselves needs no `ManageMembers`
pub async fn remove(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    user_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    let grant = resolve(&mut tx, principal, project_id).await?;

    let leaving = user_id == principal.user_id;
    let action = if leaving {
        ProjectAction::View
    } else {
        ProjectAction::ManageMembers
    };
    check(grant.role, action)?;

    let current = Membership::lock_role(&mut *tx, project_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Membership not found"))?;
    protect_owner(current)?;

    Membership::delete(&mut *tx, project_id, user_id).await?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        if leaving { "member.left" } else { "member.removed" },
        Some(user_id),
        json!({ "role": current }),
    )
    .await?;

    tx.commit().await?;

    info!(project_id = %project_id, user_id = %user_id, leaving, "Member removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_role_not_assignable() {
        assert!(matches!(
            require_assignable(MemberRole::Owner),
            Err(CoreError::Validation { .. })
        ));
        assert!(require_assignable(MemberRole::Editor).is_ok());
        assert!(require_assignable(MemberRole::Viewer).is_ok());
    }

    #[test]
    fn test_owner_membership_protected() {
        assert!(matches!(
            protect_owner(MemberRole::Owner),
            Err(CoreError::Forbidden(_))
        ));
        assert!(protect_owner(MemberRole::Editor).is_ok());
    }
}
