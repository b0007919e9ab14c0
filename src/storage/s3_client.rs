// S3 client: endpoint selection per profile and the three object calls

use crate::config::{AwsConfig, Profile};
use crate::types::{AppError, AppResult, AwsServiceError, ErrorType};
use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of a successful put, the fields callers care about from the
/// response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub etag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectContent {
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// `<Error>` document S3 sends back with every rejected request.
#[derive(Deserialize, Debug)]
struct ErrorResponse {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
}

#[derive(Clone)]
pub struct S3Client {
    bucket: Arc<Bucket>,
}

impl S3Client {
    pub fn new(aws: &AwsConfig, bucket_name: &str) -> AppResult<Self> {
        let credentials = Credentials::new(
            Some(aws.access_key.as_str()),
            Some(aws.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::AwsClient(format!("invalid credentials: {}", e)))?;

        let region = region_for(aws);
        debug!(bucket = bucket_name, region = ?region, "Building S3 client");

        let bucket: Arc<Bucket> = Arc::from(
            Bucket::new(bucket_name, region, credentials)
                .map_err(|e| AppError::AwsClient(e.to_string()))?
                .with_path_style(),
        );

        Ok(Self { bucket })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    pub async fn put_object(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> AppResult<PutObjectOutput> {
        let response = self
            .bucket
            .put_object_with_content_type(key, content, content_type)
            .await
            .map_err(translate_error)?;

        let headers = response.headers();
        Ok(PutObjectOutput {
            etag: header(&headers, "etag").map(|e| e.trim_matches('"').to_string()),
            version_id: header(&headers, "x-amz-version-id"),
        })
    }

    pub async fn get_object(&self, key: &str) -> AppResult<ObjectContent> {
        let response = self.bucket.get_object(key).await.map_err(translate_error)?;

        Ok(ObjectContent {
            content_type: header(&response.headers(), "content-type"),
            body: response.bytes().clone(),
        })
    }

    pub async fn delete_object(&self, key: &str) -> AppResult<()> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(translate_error)?;
        Ok(())
    }
}

/// Emulator endpoint for the local profile, the regional endpoint otherwise.
pub fn region_for(aws: &AwsConfig) -> Region {
    match &aws.profile {
        Profile::Local => Region::Custom {
            region: aws.region.clone(),
            endpoint: aws.localstack_url.trim_end_matches('/').to_string(),
        },
        Profile::Production(_) => Region::Custom {
            region: aws.region.clone(),
            endpoint: format!("https://s3.{}.amazonaws.com", aws.region),
        },
    }
}

fn header(headers: &HashMap<String, String>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.clone())
}

pub(crate) fn translate_error(err: S3Error) -> AppError {
    match err {
        S3Error::HttpFailWithBody(status, body) => {
            AppError::AwsService(service_error_from_body(status, &body))
        }
        other => AppError::AwsClient(other.to_string()),
    }
}

fn service_error_from_body(status: u16, body: &str) -> AwsServiceError {
    let parsed = quick_xml::de::from_str::<ErrorResponse>(body).ok();
    let (code, message, request_id) = match parsed {
        Some(e) => (e.code, e.message, e.request_id),
        None => (None, None, None),
    };

    AwsServiceError {
        message: message
            .or_else(|| code.clone())
            .unwrap_or_else(|| format!("request failed with status {}", status)),
        status_code: status,
        error_code: code,
        error_type: ErrorType::from_status(status),
        request_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws_config(profile: Profile, localstack_url: &str) -> AwsConfig {
        AwsConfig {
            profile,
            region: "eu-west-1".to_string(),
            access_key: "test".to_string(),
            secret_key: "test".to_string(),
            localstack_url: localstack_url.to_string(),
        }
    }

    const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchKey</Code>
  <Message>The specified key does not exist.</Message>
  <Key>uploads/missing.txt</Key>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

    #[test]
    fn test_local_profile_targets_emulator() {
        let region = region_for(&aws_config(Profile::Local, "http://localhost:4566/"));
        match region {
            Region::Custom { region, endpoint } => {
                assert_eq!(region, "eu-west-1");
                assert_eq!(endpoint, "http://localhost:4566");
            }
            other => panic!("unexpected region {:?}", other),
        }
    }

    #[test]
    fn test_production_profile_targets_regional_endpoint() {
        let region = region_for(&aws_config(
            Profile::Production("prod".to_string()),
            "http://localhost:4566",
        ));
        match region {
            Region::Custom { endpoint, .. } => {
                assert_eq!(endpoint, "https://s3.eu-west-1.amazonaws.com");
            }
            other => panic!("unexpected region {:?}", other),
        }
    }

    #[test]
    fn test_error_body_fields_are_extracted() {
        let err = service_error_from_body(404, NO_SUCH_KEY);
        assert_eq!(err.status_code, 404);
        assert_eq!(err.error_code.as_deref(), Some("NoSuchKey"));
        assert_eq!(err.message, "The specified key does not exist.");
        assert_eq!(err.request_id.as_deref(), Some("4442587FB7D0A2F9"));
        assert_eq!(err.error_type, ErrorType::Client);
    }

    #[test]
    fn test_unparsable_error_body_keeps_status() {
        let err = service_error_from_body(503, "Service Unavailable");
        assert_eq!(err.error_code, None);
        assert_eq!(err.error_type, ErrorType::Service);
        assert!(err.message.contains("503"));
    }

    #[tokio::test]
    async fn test_put_object_reads_etag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/needle-files/uploads/a.txt")
            .with_status(200)
            .with_header("ETag", "\"9b2cf535f27731c974343645a3985328\"")
            .with_header("x-amz-version-id", "v1")
            .create_async()
            .await;

        let client = S3Client::new(&aws_config(Profile::Local, &server.url()), "needle-files").unwrap();
        let out = client
            .put_object("uploads/a.txt", b"hello", "text/plain")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out.etag.as_deref(), Some("9b2cf535f27731c974343645a3985328"));
        assert_eq!(out.version_id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_get_object_returns_body_and_content_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/needle-files/uploads/a.txt")
            .with_status(200)
            .with_header("Content-Type", "text/plain")
            .with_body("line one\nline two")
            .create_async()
            .await;

        let client = S3Client::new(&aws_config(Profile::Local, &server.url()), "needle-files").unwrap();
        let object = client.get_object("uploads/a.txt").await.unwrap();

        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(&object.body[..], b"line one\nline two");
    }

    #[tokio::test]
    async fn test_missing_object_is_a_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/needle-files/uploads/missing.txt")
            .with_status(404)
            .with_header("Content-Type", "application/xml")
            .with_body(NO_SUCH_KEY)
            .create_async()
            .await;

        let client = S3Client::new(&aws_config(Profile::Local, &server.url()), "needle-files").unwrap();
        let err = client.get_object("uploads/missing.txt").await.unwrap_err();

        match err {
            AppError::AwsService(e) => {
                assert_eq!(e.status_code, 404);
                assert_eq!(e.error_code.as_deref(), Some("NoSuchKey"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/needle-files/uploads/a.txt")
            .with_status(204)
            .create_async()
            .await;

        let client = S3Client::new(&aws_config(Profile::Local, &server.url()), "needle-files").unwrap();
        client.delete_object("uploads/a.txt").await.unwrap();

        mock.assert_async().await;
    }
}
