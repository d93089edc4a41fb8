/// Per-project activity log
///
/// Every mutation performed through the gateways appends one entry, written
/// inside the same transaction as the change it describes. Entries are never
/// updated; they disappear only when the project is deleted.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Maximum number of entries returned by a single listing
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub project_id: Uuid,
    pub actor_id: Option<Uuid>,
    /// Dotted verb such as `task.created` or `member.removed`
    pub action: String,
    pub subject_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub async fn record<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        actor_id: Uuid,
        action: &str,
        subject_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (project_id, actor_id, action, subject_id, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(project_id)
        .bind(actor_id)
        .bind(action)
        .bind(subject_id)
        .bind(details)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Newest entries first; `before` pages backwards by id
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, project_id, actor_id, action, subject_id, details, created_at
            FROM activity_log
            WHERE project_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(project_id)
        .bind(before)
        .bind(limit.clamp(1, MAX_PAGE_SIZE))
        .fetch_all(executor)
        .await
    }
}
