/// Project file endpoints
///
/// Uploads are `multipart/form-data` with the content in a part named
/// `file`; its filename and content type are taken from the part headers.
///
/// ```text
/// curl -H "Authorization: Bearer $TOKEN" \
///      -F file=@report.pdf \
///      http://localhost:8080/v1/projects/$ID/files
/// ```
///
/// Downloads stream back the stored bytes with `Content-Type`,
/// `Content-Disposition: attachment` and an `ETag` of the SHA-256 digest.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use projecthub_shared::gateway::files::{self, NewFile};
use projecthub_shared::models::file::FileRecord;
use tracing::debug;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Auth,
};

const FILE_FIELD: &str = "file";

pub async fn list_files(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<FileRecord>>> {
    Ok(Json(files::list(&state.db, &principal, project_id).await?))
}

pub async fn upload_file(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(project_id): Path<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<FileRecord>)> {
    let upload = read_file_field(multipart?).await?;

    let record = files::upload(
        &state.db,
        state.blobs.as_ref(),
        &principal,
        project_id,
        upload,
        state.config.storage.max_upload_bytes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn download_file(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, file_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Response> {
    let download =
        files::download(&state.db, state.blobs.as_ref(), &principal, project_id, file_id).await?;

    let file = &download.file;
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&file.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.data.len()));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file.filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", file.sha256)) {
        headers.insert(header::ETAG, value);
    }

    Ok((headers, download.data).into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path((project_id, file_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    files::delete(&state.db, state.blobs.as_ref(), &principal, project_id, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reads the `file` part, skipping any other fields
async fn read_file_field(mut multipart: Multipart) -> ApiResult<NewFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        return Ok(NewFile {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::validation(FILE_FIELD, "Missing multipart field 'file'"))
}

/// `attachment; filename="..."` with anything outside printable ASCII replaced
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!("attachment; filename=\"{}\"", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_sanitizes() {
        assert_eq!(
            content_disposition("naïve \"quote\".txt"),
            "attachment; filename=\"na_ve _quote_.txt\""
        );
    }
}
