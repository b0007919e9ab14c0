// Error types shared by the storage, queue and HTTP layers

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Which side of the wire AWS blames for a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorType {
    Client,
    Service,
    Unknown,
}

impl ErrorType {
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => ErrorType::Client,
            500..=599 => ErrorType::Service,
            _ => ErrorType::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorType::Client => write!(f, "Client"),
            ErrorType::Service => write!(f, "Service"),
            ErrorType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A request that reached AWS (or the emulator) and came back rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsServiceError {
    pub message: String,
    pub status_code: u16,
    pub error_code: Option<String>,
    pub error_type: ErrorType,
    pub request_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("AWS service error: {}", .0.message)]
    AwsService(AwsServiceError),

    #[error("AWS client error: {0}")]
    AwsClient(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AwsService(e) if e.status_code == 404 => StatusCode::NOT_FOUND,
            AppError::AwsService(_) | AppError::AwsClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Io(_) | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Logs every field of an AWS failure as its own structured value.
pub fn log_aws_error(service: &str, operation: &str, err: &AppError) {
    match err {
        AppError::AwsService(e) => error!(
            service,
            operation,
            aws_message = %e.message,
            status_code = e.status_code,
            error_code = e.error_code.as_deref().unwrap_or("-"),
            error_type = %e.error_type,
            request_id = e.request_id.as_deref().unwrap_or("-"),
            "{} rejected the {} request",
            service,
            operation
        ),
        AppError::AwsClient(message) => error!(
            service,
            operation,
            aws_message = %message,
            "{} client error during {} request",
            service,
            operation
        ),
        other => error!(service, operation, "{} {} request failed: {}", service, operation, other),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a AwsServiceError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            AppError::AwsService(e) => Some(e),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
