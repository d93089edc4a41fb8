/// Uploaded file metadata
///
/// The bytes live in a [`BlobStore`](crate::storage::BlobStore) under
/// `storage_key`; this table only records what was stored and by whom.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE files (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     filename VARCHAR(255) NOT NULL,
///     content_type VARCHAR(255) NOT NULL,
///     size_bytes BIGINT NOT NULL,
///     sha256 CHAR(64) NOT NULL,
///     storage_key VARCHAR(512) NOT NULL,
///     uploaded_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

const FILE_COLUMNS: &str =
    "id, project_id, filename, content_type, size_bytes, sha256, storage_key, uploaded_by, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Lowercase hex SHA-256 of the content
    pub sha256: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub storage_key: String,
    pub uploaded_by: Uuid,
}

impl FileRecord {
    /// Inserts metadata for a blob that has already been written
    ///
    /// The id is chosen by the caller since it is part of the storage key.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateFile,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO files (id, project_id, filename, content_type, size_bytes, sha256,
                                storage_key, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            FILE_COLUMNS
        );

        sqlx::query_as::<_, FileRecord>(&query)
            .bind(data.id)
            .bind(data.project_id)
            .bind(data.filename)
            .bind(data.content_type)
            .bind(data.size_bytes)
            .bind(data.sha256)
            .bind(data.storage_key)
            .bind(data.uploaded_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_in_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM files WHERE project_id = $1 AND id = $2",
            FILE_COLUMNS
        );

        sqlx::query_as::<_, FileRecord>(&query)
            .bind(project_id)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Files in a project, newest first
    pub async fn list_by_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM files WHERE project_id = $1 ORDER BY created_at DESC",
            FILE_COLUMNS
        );

        sqlx::query_as::<_, FileRecord>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    /// Deletes the metadata row and returns it, so the caller can remove the
    /// blob afterwards
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "DELETE FROM files WHERE project_id = $1 AND id = $2 RETURNING {}",
            FILE_COLUMNS
        );

        sqlx::query_as::<_, FileRecord>(&query)
            .bind(project_id)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
