//! Error types for the AWS helpers

use std::fmt;

#[derive(Debug)]
pub enum AwsError {
    /// S3 operation failed
    S3(aws_sdk_s3::Error),
    /// SQS operation failed
    Sqs(aws_sdk_sqs::Error),
    /// HTTP request failed (file transfer, Elasticsearch)
    Http(reqwest::Error),
    /// Elasticsearch answered with a non-success status
    Status(u16, String),
    /// Failed to parse or serialize JSON
    Json(serde_json::Error),
    /// Object body could not be read or decoded
    Body(String),
    /// Missing or invalid configuration
    Config(String),
}

impl fmt::Display for AwsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3(e) => write!(f, "S3 error: {}", e),
            Self::Sqs(e) => write!(f, "SQS error: {}", e),
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status(code, body) => write!(f, "HTTP Status Code: {} {}", code, body),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Body(msg) => write!(f, "{}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AwsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::S3(e) => Some(e),
            Self::Sqs(e) => Some(e),
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<aws_sdk_s3::Error> for AwsError {
    fn from(e: aws_sdk_s3::Error) -> Self {
        Self::S3(e)
    }
}

impl From<aws_sdk_sqs::Error> for AwsError {
    fn from(e: aws_sdk_sqs::Error) -> Self {
        Self::Sqs(e)
    }
}

impl From<reqwest::Error> for AwsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for AwsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for AWS helper operations
pub type Result<T> = std::result::Result<T, AwsError>;
