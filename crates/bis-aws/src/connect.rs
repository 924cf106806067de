//! SDK clients with optional per-service endpoint overrides

use aws_config::BehaviorVersion;
use std::time::Duration;

/// Timeout for plain HTTP calls (file downloads, Elasticsearch)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest client that gives up on a request after `timeout`
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Endpoint from `AWS_HOST_{service}`, if set
pub fn endpoint_override(service: &str) -> Option<String> {
    std::env::var(format!("AWS_HOST_{}", service))
        .ok()
        .filter(|v| !v.is_empty())
}

async fn shared_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// S3 client from the default credential chain; overridden endpoints use path-style addressing
pub async fn s3_client() -> aws_sdk_s3::Client {
    let shared = shared_config().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = endpoint_override("S3") {
        tracing::debug!(endpoint = %endpoint, "S3 endpoint override");
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

pub async fn sqs_client() -> aws_sdk_sqs::Client {
    let shared = shared_config().await;
    let mut builder = aws_sdk_sqs::config::Builder::from(&shared);
    if let Some(endpoint) = endpoint_override("SQS") {
        tracing::debug!(endpoint = %endpoint, "SQS endpoint override");
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_sqs::Client::from_conf(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_override() {
        std::env::set_var("AWS_HOST_BisTestService", "http://localhost:4566");
        assert_eq!(
            endpoint_override("BisTestService").as_deref(),
            Some("http://localhost:4566")
        );
        std::env::set_var("AWS_HOST_BisTestService", "");
        assert!(endpoint_override("BisTestService").is_none());
        assert!(endpoint_override("BisUnsetService").is_none());
    }
}
