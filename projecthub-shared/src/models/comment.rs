/// Issue comment model
///
/// Comments carry their `project_id` so they can be scoped without joining
/// through `issues`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub issue_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's username, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_username: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        issue_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (project_id, issue_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, issue_id, author_id, body, created_at
            "#,
        )
        .bind(project_id)
        .bind(issue_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(executor)
        .await
    }

    pub async fn find_on_issue<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        issue_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, project_id, issue_id, author_id, body, created_at
            FROM comments
            WHERE project_id = $1 AND issue_id = $2 AND id = $3
            "#,
        )
        .bind(project_id)
        .bind(issue_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Comments on an issue, oldest first
    pub async fn list_for_issue<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        issue_id: Uuid,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.issue_id, c.author_id, u.username AS author_username,
                   c.body, c.created_at
            FROM comments c
            LEFT JOIN users u ON u.id = c.author_id
            WHERE c.project_id = $1 AND c.issue_id = $2
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(project_id)
        .bind(issue_id)
        .fetch_all(executor)
        .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
