//! Storage layer
//!
//! `UploadService` turns an uploaded file into an S3 object: the payload is
//! staged in a temporary local file, put under a timestamp-prefixed key and
//! the temporary file is removed again. Downloads and deletes go straight
//! through to the bucket.

pub mod s3_client;

pub use s3_client::*;

use crate::config::StorageConfig;
use crate::types::{log_aws_error, AppError, AppResult};
use crate::utils::clean_path;
use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const FALLBACK_FILE_NAME: &str = "file";

/// A file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub bucket: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct DownloadedObject {
    pub key: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct UploadService {
    client: S3Client,
    location: String,
    temp_dir: PathBuf,
}

impl UploadService {
    pub fn new(client: S3Client, config: &StorageConfig) -> Self {
        Self {
            client,
            location: config.location.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn bucket_name(&self) -> String {
        self.client.bucket_name()
    }

    pub async fn upload_file(&self, file: UploadedFile) -> AppResult<UploadResponse> {
        let original = file.original_filename.as_deref().unwrap_or_default();
        let file_name = generate_file_name(original, chrono::Utc::now().timestamp_millis());
        let key = object_key(&self.location, &file_name);

        if file.bytes.is_empty() {
            return Err(AppError::Storage(format!(
                "Failed to store empty file {}",
                file_name
            )));
        }

        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(&file_name));

        let staged = stage_to_temp_file(&self.temp_dir, &file.bytes).await?;
        let result = self.put_staged(staged.path(), &key, &content_type).await;
        clean_up(staged);

        match result {
            Ok(output) => {
                info!(key = %key, size = file.bytes.len(), "Uploaded file to S3");
                Ok(UploadResponse {
                    bucket: self.bucket_name(),
                    key,
                    etag: output.etag,
                    version_id: output.version_id,
                    content_type,
                    size: file.bytes.len(),
                })
            }
            Err(e) => {
                log_aws_error("S3", "PUT", &e);
                Err(e)
            }
        }
    }

    async fn put_staged(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> AppResult<PutObjectOutput> {
        let body = tokio::fs::read(path).await?;
        self.client.put_object(key, &body, content_type).await
    }

    pub async fn download_file(&self, key: &str) -> AppResult<DownloadedObject> {
        info!(key, "Downloading an object");

        match self.client.get_object(key).await {
            Ok(object) => {
                info!(
                    "Content-Type: {}",
                    object.content_type.as_deref().unwrap_or("unknown")
                );
                info!("===================== Import File - Done! =====================");
                Ok(DownloadedObject {
                    key: key.to_string(),
                    content_type: object.content_type,
                    body: object.body,
                })
            }
            Err(e) => {
                log_aws_error("S3", "GET", &e);
                Err(e)
            }
        }
    }

    pub async fn delete_file(&self, key: &str) -> AppResult<String> {
        match self.client.delete_object(key).await {
            Ok(()) => {
                info!(key, "Deleted object from S3");
                Ok("Successfully deleted".to_string())
            }
            Err(e) => {
                log_aws_error("S3", "DELETE", &e);
                Err(e)
            }
        }
    }
}

/// `<millis>-<cleaned name>`, with spaces turned into underscores.
pub fn generate_file_name(original: &str, millis: i64) -> String {
    let cleaned = clean_path(original);
    let name = if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.replace(' ', "_")
    };
    format!("{}-{}", millis, name)
}

pub fn object_key(location: &str, file_name: &str) -> String {
    let location = location.trim_end_matches('/');
    if location.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", location, file_name)
    }
}

fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

async fn stage_to_temp_file(dir: &Path, bytes: &[u8]) -> AppResult<NamedTempFile> {
    tokio::fs::create_dir_all(dir).await?;
    let staged = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(dir)?;
    tokio::fs::write(staged.path(), bytes).await?;
    debug!(path = %staged.path().display(), "Staged upload in temporary file");
    Ok(staged)
}

fn clean_up(staged: NamedTempFile) {
    let path = staged.path().display().to_string();
    if let Err(e) = staged.close() {
        warn!(path = %path, "Failed to remove temporary file: {}", e);
    }
}
