use crate::config::AwsConfig;
use crate::types::{log_aws_error, AppError, AppResult, AwsServiceError, ErrorType};
use aws_sdk_sqs::config::http::HttpResponse;
use aws_sdk_sqs::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::Client;
use serde::Serialize;
use tracing::{debug, info};

const CREDENTIALS_PROVIDER: &str = "needle-storage-static";

/// Builds the SQS client with the same endpoint rules as S3: the emulator for
/// the local profile, the configured region otherwise.
pub fn build_sqs_client(aws: &AwsConfig) -> Client {
    let credentials = Credentials::new(
        aws.access_key.clone(),
        aws.secret_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER,
    );

    let mut builder = aws_sdk_sqs::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(aws.region.clone()))
        .credentials_provider(credentials);

    if let Some(endpoint) = aws.endpoint_override() {
        debug!(endpoint, "Pointing SQS client at emulator");
        builder = builder.endpoint_url(endpoint);
    }

    Client::from_conf(builder.build())
}

/// Converts payloads to JSON and sends them to a queue.
#[derive(Clone)]
pub struct QueueTemplate {
    client: Client,
    default_destination: Option<String>,
}

impl QueueTemplate {
    pub fn new(client: Client, default_destination: Option<String>) -> Self {
        Self {
            client,
            default_destination,
        }
    }

    pub fn default_destination(&self) -> Option<&str> {
        self.default_destination.as_deref()
    }

    /// Sends `payload` to `destination`, a queue URL or a queue name.
    /// Returns the message id SQS assigned.
    pub async fn convert_and_send<T: Serialize>(
        &self,
        destination: &str,
        payload: &T,
    ) -> AppResult<String> {
        let body = to_message_body(payload)?;
        let queue_url = self.resolve_queue_url(destination).await?;

        let output = self
            .client
            .send_message()
            .queue_url(&queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| log_sqs_error("SendMessage", sdk_error(e)))?;

        let message_id = output.message_id().unwrap_or_default().to_string();
        info!(queue_url = %queue_url, message_id = %message_id, "Message sent");
        Ok(message_id)
    }

    pub async fn convert_and_send_default<T: Serialize>(&self, payload: &T) -> AppResult<String> {
        let destination = self.default_destination.clone().ok_or_else(|| {
            AppError::InvalidRequest("no default queue destination configured".to_string())
        })?;
        self.convert_and_send(&destination, payload).await
    }

    async fn resolve_queue_url(&self, destination: &str) -> AppResult<String> {
        if is_queue_url(destination) {
            return Ok(destination.to_string());
        }

        let output = self
            .client
            .get_queue_url()
            .queue_name(destination)
            .send()
            .await
            .map_err(|e| log_sqs_error("GetQueueUrl", sdk_error(e)))?;

        output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| AppError::AwsClient(format!("no URL returned for queue {}", destination)))
    }
}

pub fn is_queue_url(destination: &str) -> bool {
    destination.starts_with("https://") || destination.starts_with("http://")
}

pub fn to_message_body<T: Serialize>(payload: &T) -> AppResult<String> {
    Ok(serde_json::to_string(payload)?)
}

fn sdk_error<E>(err: SdkError<E, HttpResponse>) -> AppError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.raw_response() {
        Some(raw) => {
            let status = raw.status().as_u16();
            AppError::AwsService(AwsServiceError {
                message: err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
                status_code: status,
                error_code: err.code().map(str::to_string),
                error_type: ErrorType::from_status(status),
                request_id: raw.headers().get("x-amzn-requestid").map(str::to_string),
            })
        }
        None => AppError::AwsClient(DisplayErrorContext(&err).to_string()),
    }
}

fn log_sqs_error(operation: &str, err: AppError) -> AppError {
    log_aws_error("SQS", operation, &err);
    err
}
