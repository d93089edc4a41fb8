/// Issue model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE issue_status AS ENUM ('open', 'in_progress', 'closed');
/// CREATE TYPE issue_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE issues (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status issue_status NOT NULL DEFAULT 'open',
///     priority issue_priority NOT NULL DEFAULT 'medium',
///     reporter_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     closed_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

const ISSUE_COLUMNS: &str = "id, project_id, title, description, status, priority, reporter_id, \
                             created_at, updated_at, closed_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    /// Closed issues accept no further comments
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Closed => "closed",
        }
    }

    pub fn accepts_comments(&self) -> bool {
        !matches!(self, IssueStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
}

impl Default for IssuePriority {
    fn default() -> Self {
        IssuePriority::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateIssue {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub reporter_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
}

impl Issue {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateIssue,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO issues (project_id, title, description, priority, reporter_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            ISSUE_COLUMNS
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.reporter_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_in_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM issues WHERE project_id = $1 AND id = $2",
            ISSUE_COLUMNS
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Reads an issue and locks it so its status cannot change until the
    /// transaction ends
    pub async fn lock_in_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM issues WHERE project_id = $1 AND id = $2 FOR SHARE",
            ISSUE_COLUMNS
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Issues in a project, newest first, optionally filtered by status
    pub async fn list_by_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        status: Option<IssueStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM issues
             WHERE project_id = $1 AND ($2::issue_status IS NULL OR status = $2)
             ORDER BY created_at DESC",
            ISSUE_COLUMNS
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .bind(status)
            .fetch_all(executor)
            .await
    }

    /// Applies a partial update; moving to `closed` stamps `closed_at`,
    /// moving away from it clears the stamp
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
        data: UpdateIssue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE issues
             SET title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 status = COALESCE($5, status),
                 priority = COALESCE($6, priority),
                 closed_at = CASE
                     WHEN $5::issue_status IS NULL THEN closed_at
                     WHEN $5 = 'closed' THEN COALESCE(closed_at, NOW())
                     ELSE NULL
                 END,
                 updated_at = NOW()
             WHERE project_id = $1 AND id = $2
             RETURNING {}",
            ISSUE_COLUMNS
        );

        sqlx::query_as::<_, Issue>(&query)
            .bind(project_id)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE project_id = $1 AND id = $2")
            .bind(project_id)
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_issue_rejects_comments() {
        assert!(IssueStatus::Open.accepts_comments());
        assert!(IssueStatus::InProgress.accepts_comments());
        assert!(!IssueStatus::Closed.accepts_comments());
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(IssuePriority::default(), IssuePriority::Medium);
    }

    #[test]
    fn test_status_serde() {
        let status: IssueStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(status, IssueStatus::Closed);
        assert_eq!(IssueStatus::InProgress.as_str(), "in_progress");
    }
}
