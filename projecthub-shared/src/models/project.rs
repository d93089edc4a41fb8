/// Project model and database operations
///
/// A project is owned by the user who created it; the owner never changes.
/// Deleting a project cascades to its memberships, tasks, issues, comments,
/// files and activity log.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_visibility AS ENUM ('private', 'public');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     visibility project_visibility NOT NULL DEFAULT 'private',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::membership::MemberRole;

const PROJECT_COLUMNS: &str =
    "id, owner_id, title, description, visibility, created_at, updated_at";

/// Who can see a project without a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Members only
    Private,

    /// Any authenticated user may read and comment
    Public,
}

impl Visibility {
    pub fn from_public_flag(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(&self) -> bool {
        *self == Visibility::Public
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project together with the caller's stored membership role, if any
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectWithMembership {
    #[sqlx(flatten)]
    pub project: Project,
    pub member_role: Option<MemberRole>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Project {
    /// Inserts the project row only; the owner membership is created by the
    /// caller in the same transaction
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (owner_id, title, description, visibility)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.owner_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.visibility)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Projects the user is a member of, plus every public project
    pub async fn list_visible_to<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithMembership>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithMembership>(
            r#"
            SELECT p.id, p.owner_id, p.title, p.description, p.visibility,
                   p.created_at, p.updated_at, m.role AS member_role
            FROM projects p
            LEFT JOIN memberships m ON m.project_id = p.id AND m.user_id = $1
            WHERE m.user_id IS NOT NULL OR p.visibility = 'public'
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Every project, with the user's membership role where one exists
    pub async fn list_all_for<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithMembership>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithMembership>(
            r#"
            SELECT p.id, p.owner_id, p.title, p.description, p.visibility,
                   p.created_at, p.updated_at, m.role AS member_role
            FROM projects p
            LEFT JOIN memberships m ON m.project_id = p.id AND m.user_id = $1
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE projects
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .fetch_optional(executor)
            .await
    }

    pub async fn set_visibility<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET visibility = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(visibility)
            .fetch_optional(executor)
            .await
    }

    /// Deletes the project; dependent rows go with it via ON DELETE CASCADE
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of projects owned by a user, used to purge blobs before the user
    /// (and by cascade their projects) is deleted
    pub async fn ids_owned_by<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM projects WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_flag() {
        assert_eq!(Visibility::from_public_flag(true), Visibility::Public);
        assert_eq!(Visibility::from_public_flag(false), Visibility::Private);
        assert!(Visibility::Public.is_public());
        assert!(!Visibility::Private.is_public());
    }

    #[test]
    fn test_visibility_serde() {
        assert_eq!(
            serde_json::to_string(&Visibility::Public).unwrap(),
            "\"public\""
        );
        let parsed: Visibility = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(parsed, Visibility::Private);
    }
}
