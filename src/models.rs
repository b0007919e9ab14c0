use crate::config::Config;
use crate::queue::{build_sqs_client, QueueTemplate};
use crate::storage::{S3Client, UploadService};
use crate::types::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub uploads: UploadService,
    pub queue: QueueTemplate,
}

impl AppState {
    /// Wires the S3 and SQS clients for the configured profile.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let s3 = S3Client::new(&config.aws, &config.storage.bucket)?;
        let uploads = UploadService::new(s3, &config.storage);
        let queue = QueueTemplate::new(
            build_sqs_client(&config.aws),
            config.queue.default_destination.clone(),
        );

        Ok(Self {
            config,
            uploads,
            queue,
        })
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub bucket: String,
    pub profile: String,
}

#[derive(Debug, serde::Serialize)]
pub struct DeleteResponse {
    pub message: String,
}
