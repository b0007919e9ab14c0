use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use crate::models::{AppState, DeleteResponse};
use crate::storage::{UploadResponse, UploadedFile};
use crate::types::{AppError, AppResult};
use crate::utils::display_text;
use tracing::{debug, info};

/// Multipart part the upload form must carry.
const FILE_PART: &str = "file";

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route(
            "/upload-file",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download-file/{*key}", get(download_file))
        .route("/files/{*key}", delete(delete_file))
        .with_state(state)
}

async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_PART) {
            debug!(part = ?field.name(), "Skipping multipart part");
            continue;
        }

        let original_filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        info!(
            filename = original_filename.as_deref().unwrap_or("-"),
            size = bytes.len(),
            "File upload request received"
        );

        let response = state
            .uploads
            .upload_file(UploadedFile {
                original_filename,
                content_type,
                bytes,
            })
            .await?;
        return Ok(Json(response));
    }

    Err(AppError::InvalidRequest(format!(
        "Required request part '{}' is not present",
        FILE_PART
    )))
}

async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    let object = state.uploads.download_file(&key).await?;

    let mut printed = Vec::new();
    display_text(&object.body, &mut printed)?;
    debug!(key = %object.key, "\n{}", String::from_utf8_lossy(&printed));

    let content_type = object
        .content_type
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], object.body).into_response())
}

async fn delete_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let message = state.uploads.delete_file(&key).await?;
    Ok(Json(DeleteResponse { message }))
}
