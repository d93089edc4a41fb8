//! Project file uploads
//!
//! Upload writes the blob first and the metadata row second. If the database
//! step fails the blob is removed again, so a committed row always points at
//! stored bytes.

use bytes::Bytes;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{bounded_text, required_text};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::activity::ActivityEntry;
use crate::models::file::{CreateFile, FileRecord};
use crate::storage::{file_key, sha256_hex, BlobStore};

const FILENAME_MAX: usize = 255;
const CONTENT_TYPE_MAX: usize = 255;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Metadata plus content, as returned by [`download`]
#[derive(Debug, Clone)]
pub struct Download {
    pub file: FileRecord,
    pub data: Bytes,
}

/// Strips any directory components a client may have sent
fn clean_filename(raw: &str) -> CoreResult<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let name = required_text("filename", base, FILENAME_MAX)?;
    if name == "." || name == ".." || name.chars().any(char::is_control) {
        return Err(CoreError::validation("filename", "Invalid filename"));
    }
    Ok(name)
}

fn clean_content_type(raw: Option<String>) -> CoreResult<String> {
    match raw.map(|ct| ct.trim().to_string()) {
        Some(ct) if !ct.is_empty() => {
            if !ct.contains('/') || ct.chars().any(|c| c.is_control()) {
                return Err(CoreError::validation("content_type", "Invalid content type"));
            }
            bounded_text("content_type", &ct, CONTENT_TYPE_MAX)
        }
        _ => Ok(DEFAULT_CONTENT_TYPE.to_string()),
    }
}

fn check_size(len: usize, max_bytes: usize) -> CoreResult<()> {
    if len == 0 {
        return Err(CoreError::validation("file", "File is empty"));
    }
    if len > max_bytes {
        return Err(CoreError::validation(
            "file",
            format!("File exceeds the {} byte upload limit", max_bytes),
        ));
    }
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
) -> CoreResult<Vec<FileRecord>> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Ok(FileRecord::list_by_project(&mut *conn, project_id).await?)
}

pub async fn upload(
    pool: &PgPool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    project_id: Uuid,
    input: NewFile,
    max_bytes: usize,
) -> CoreResult<FileRecord> {
    let filename = clean_filename(&input.filename)?;
    let content_type = clean_content_type(input.content_type)?;
    check_size(input.data.len(), max_bytes)?;

    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    let file_id = Uuid::new_v4();
    let storage_key = file_key(project_id, file_id);
    let sha256 = sha256_hex(&input.data);
    let size_bytes = input.data.len() as i64;

    blobs.put(&storage_key, input.data).await?;

    let stored = async {
        let file = FileRecord::create(
            &mut *tx,
            CreateFile {
                id: file_id,
                project_id,
                filename,
                content_type,
                size_bytes,
                sha256,
                storage_key: storage_key.clone(),
                uploaded_by: principal.user_id,
            },
        )
        .await?;
        ActivityEntry::record(
            &mut *tx,
            project_id,
            principal.user_id,
            "file.uploaded",
            Some(file.id),
            json!({ "filename": file.filename, "size_bytes": file.size_bytes }),
        )
        .await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>(file)
    }
    .await;

    match stored {
        Ok(file) => {
            info!(project_id = %project_id, file_id = %file.id, size_bytes, "File uploaded");
            Ok(file)
        }
        Err(e) => {
            if let Err(cleanup) = blobs.delete(&storage_key).await {
                warn!(key = %storage_key, error = %cleanup, "Failed to remove orphaned blob");
            }
            Err(e.into())
        }
    }
}

pub async fn download(
    pool: &PgPool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    project_id: Uuid,
    file_id: Uuid,
) -> CoreResult<Download> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    let file = FileRecord::find_in_project(&mut *conn, project_id, file_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("File {} not found", file_id)))?;
    drop(conn);

    let data = blobs.get(&file.storage_key).await?;
    Ok(Download { file, data })
}

/// Removes the metadata row, then the blob
pub async fn delete(
    pool: &PgPool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    project_id: Uuid,
    file_id: Uuid,
) -> CoreResult<()> {
    let mut tx = pool.begin().await?;
    authorize(&mut tx, principal, project_id, ProjectAction::ManageContent).await?;

    let file = FileRecord::delete(&mut *tx, project_id, file_id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("File {} not found", file_id)))?;
    ActivityEntry::record(
        &mut *tx,
        project_id,
        principal.user_id,
        "file.deleted",
        Some(file.id),
        json!({ "filename": file.filename }),
    )
    .await?;
    tx.commit().await?;

    if let Err(e) = blobs.delete(&file.storage_key).await {
        warn!(key = %file.storage_key, error = %e, "Failed to remove deleted file's blob");
    }

    info!(project_id = %project_id, file_id = %file_id, "File deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filename_strips_directories() {
        assert_eq!(clean_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(clean_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(clean_filename("C:\\Users\\ada\\notes.txt").unwrap(), "notes.txt");
        assert!(clean_filename("dir/").is_err());
        assert!(clean_filename("..").is_err());
    }

    #[test]
    fn test_clean_content_type() {
        assert_eq!(clean_content_type(None).unwrap(), DEFAULT_CONTENT_TYPE);
        assert_eq!(clean_content_type(Some("  ".into())).unwrap(), DEFAULT_CONTENT_TYPE);
        assert_eq!(
            clean_content_type(Some("text/plain".into())).unwrap(),
            "text/plain"
        );
        assert!(clean_content_type(Some("nonsense".into())).is_err());
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(1, 10).is_ok());
        assert!(check_size(10, 10).is_ok());
        assert!(check_size(11, 10).is_err());
        assert!(check_size(0, 10).is_err());
    }
}
