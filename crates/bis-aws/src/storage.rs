//! S3 object storage

use crate::connect::{http_client, s3_client, REQUEST_TIMEOUT};
use crate::error::{AwsError, Result};
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// How an object body should be handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Bytes,
    Json,
    Lines,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectContent {
    Bytes(Vec<u8>),
    Json(Value),
    /// UTF-8 lines with their line endings kept
    Lines(Vec<String>),
}

impl ObjectContent {
    pub fn decode(body: Vec<u8>, return_type: ReturnType) -> Result<Self> {
        match return_type {
            ReturnType::Bytes => Ok(Self::Bytes(body)),
            ReturnType::Json => Ok(Self::Json(serde_json::from_slice(&body)?)),
            ReturnType::Lines => {
                let text = String::from_utf8(body)
                    .map_err(|_| AwsError::Body("File encoding problem encountered".to_string()))?;
                Ok(Self::Lines(text.split_inclusive('\n').map(str::to_string).collect()))
            }
        }
    }
}

/// Outcome of copying a remote file into a bucket
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub key_name: String,
    pub source_url: String,
    pub e_tag: Option<String>,
}

/// Object key for a URL: host followed by path
pub fn url_to_s3_key(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| AwsError::Config(format!("invalid URL {}: {}", url, e)))?;
    let host = parsed.host_str().unwrap_or_default();
    let host = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok(format!("{}{}", host, parsed.path()))
}

pub struct Storage {
    s3: aws_sdk_s3::Client,
    http: reqwest::Client,
}

impl Storage {
    pub fn new(s3: aws_sdk_s3::Client) -> Self {
        Self::with_timeout(s3, REQUEST_TIMEOUT)
    }

    /// Storage whose file downloads give up after `timeout`
    pub fn with_timeout(s3: aws_sdk_s3::Client, timeout: Duration) -> Self {
        Self {
            s3,
            http: http_client(timeout),
        }
    }

    /// Storage on the default credential chain, honoring `AWS_HOST_S3`
    pub async fn from_env() -> Self {
        Self::new(s3_client().await)
    }

    /// Create a bucket unless it already exists
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        match self.s3.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket, "Created bucket");
                Ok(())
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_bucket_already_owned_by_you() || err.is_bucket_already_exists() {
                    Ok(())
                } else {
                    Err(aws_sdk_s3::Error::from(err).into())
                }
            }
        }
    }

    /// Fetch an object; a missing key is `None`
    pub async fn get_object(
        &self,
        key: &str,
        bucket: &str,
        return_type: ReturnType,
    ) -> Result<Option<ObjectContent>> {
        self.ensure_bucket(bucket).await?;

        let output = match self.s3.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    debug!(bucket, key, "No such key");
                    return Ok(None);
                }
                return Err(aws_sdk_s3::Error::from(err).into());
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| AwsError::Body(e.to_string()))?
            .into_bytes()
            .to_vec();
        ObjectContent::decode(body, return_type).map(Some)
    }

    pub async fn remove_object(&self, key: &str, bucket: &str) -> Result<()> {
        self.s3
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        Ok(())
    }

    /// Download `source_url` and store it, keyed by [`url_to_s3_key`] unless a key is given
    pub async fn transfer_file(
        &self,
        source_url: &str,
        bucket: &str,
        key_name: Option<&str>,
    ) -> Result<TransferResult> {
        let key_name = match key_name {
            Some(key) => key.to_string(),
            None => url_to_s3_key(source_url)?,
        };
        self.ensure_bucket(bucket).await?;

        let response = self.http.get(source_url).send().await?;
        if !response.status().is_success() {
            return Err(AwsError::Status(response.status().as_u16(), source_url.to_string()));
        }
        let content = response.bytes().await?;

        let output = self
            .s3
            .put_object()
            .bucket(bucket)
            .key(&key_name)
            .body(ByteStream::from(content.to_vec()))
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        info!(bucket, key = %key_name, source_url, "Transferred file");

        Ok(TransferResult {
            key_name,
            source_url: source_url.to_string(),
            e_tag: output.e_tag().map(str::to_string),
        })
    }

    /// Store a value as a JSON object; returns the object's ETag
    pub async fn put_json<T: Serialize>(
        &self,
        data: &T,
        key: &str,
        bucket: &str,
    ) -> Result<Option<String>> {
        self.ensure_bucket(bucket).await?;
        let body = serde_json::to_vec(data)?;
        let output = self
            .s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        Ok(output.e_tag().map(str::to_string))
    }

    pub async fn object_exists(&self, key: &str, bucket: &str) -> Result<bool> {
        match self.s3.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(aws_sdk_s3::Error::from(err).into())
                }
            }
        }
    }

    /// Every key in a bucket
    pub async fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let output = self
                .s3
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(aws_sdk_s3::Error::from)?;
            keys.extend(output.contents().iter().filter_map(|o| o.key().map(str::to_string)));

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local_s3(endpoint: &str) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    fn local_storage(endpoint: &str) -> Storage {
        Storage::new(local_s3(endpoint))
    }

    async fn mount_bucket(server: &MockServer, bucket: &str) {
        Mock::given(method("PUT"))
            .and(path(format!("/{}", bucket)))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    #[test]
    fn test_url_to_s3_key() {
        assert_eq!(
            url_to_s3_key("https://www.sciencebase.gov/catalog/file/get/abc?f=1").unwrap(),
            "www.sciencebase.gov/catalog/file/get/abc"
        );
        assert_eq!(
            url_to_s3_key("http://localhost:8080/data.json").unwrap(),
            "localhost:8080/data.json"
        );
        assert!(url_to_s3_key("not a url").is_err());
    }

    #[test]
    fn test_decode_lines_keeps_endings() {
        let content = ObjectContent::decode(b"a,b\n1,2\n3,4".to_vec(), ReturnType::Lines).unwrap();
        assert_eq!(
            content,
            ObjectContent::Lines(vec!["a,b\n".into(), "1,2\n".into(), "3,4".into()])
        );
    }

    #[test]
    fn test_decode_json_and_bad_encoding() {
        let content = ObjectContent::decode(br#"{"id": 1}"#.to_vec(), ReturnType::Json).unwrap();
        assert_eq!(content, ObjectContent::Json(json!({"id": 1})));

        let err = ObjectContent::decode(vec![0xff, 0xfe, 0x00], ReturnType::Lines).unwrap_err();
        assert_eq!(err.to_string(), "File encoding problem encountered");
    }

    #[tokio::test]
    async fn test_list_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ndc-file-cache"))
            .and(query_param("list-type", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>ndc-file-cache</Name>
  <KeyCount>2</KeyCount>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>www.sciencebase.gov/a.json</Key><Size>10</Size></Contents>
  <Contents><Key>www.sciencebase.gov/b.json</Key><Size>12</Size></Contents>
</ListBucketResult>"#,
            ))
            .mount(&server)
            .await;

        let storage = local_storage(&server.uri());
        let keys = storage.list_keys("ndc-file-cache").await.unwrap();
        assert_eq!(keys, vec!["www.sciencebase.gov/a.json", "www.sciencebase.gov/b.json"]);
    }

    #[tokio::test]
    async fn test_object_exists_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ndc-file-cache/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let storage = local_storage(&server.uri());
        assert!(!storage.object_exists("missing.json", "ndc-file-cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_object_missing_key() {
        let server = MockServer::start().await;
        mount_bucket(&server, "ndc-file-cache").await;
        Mock::given(method("GET"))
            .and(path("/ndc-file-cache/missing.json"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("Content-Type", "application/xml")
                    .set_body_string(
                        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>missing.json</Key></Error>"#,
                    ),
            )
            .mount(&server)
            .await;

        let storage = local_storage(&server.uri());
        let content = storage
            .get_object("missing.json", "ndc-file-cache", ReturnType::Json)
            .await
            .unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_get_object_as_lines() {
        let server = MockServer::start().await;
        mount_bucket(&server, "ndc-file-cache").await;
        Mock::given(method("GET"))
            .and(path("/ndc-file-cache/species.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("name,tsn\nPuma concolor,552479\n"))
            .mount(&server)
            .await;

        let storage = local_storage(&server.uri());
        let content = storage
            .get_object("species.csv", "ndc-file-cache", ReturnType::Lines)
            .await
            .unwrap();
        assert_eq!(
            content,
            Some(ObjectContent::Lines(vec![
                "name,tsn\n".into(),
                "Puma concolor,552479\n".into()
            ]))
        );
    }

    #[tokio::test]
    async fn test_transfer_times_out_on_slow_source() {
        let server = MockServer::start().await;
        mount_bucket(&server, "ndc-file-cache").await;
        Mock::given(method("GET"))
            .and(path("/slow.json"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let storage = Storage::with_timeout(local_s3(&server.uri()), Duration::from_millis(200));
        let source = format!("{}/slow.json", server.uri());
        let err = storage
            .transfer_file(&source, "ndc-file-cache", Some("slow.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AwsError::Http(ref e) if e.is_timeout()));
    }
}
