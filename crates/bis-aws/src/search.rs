//! Elasticsearch index management over the REST API

use crate::connect::{endpoint_override, http_client, REQUEST_TIMEOUT};
use crate::error::{AwsError, Result};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Settings for new indexes: single shard, no replicas, malformed values ignored
pub fn index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
            "index.mapping.ignore_malformed": true
        }
    })
}

pub struct Search {
    http: Client,
    host: String,
}

impl Search {
    pub fn new(host: &str) -> Self {
        Self::with_timeout(host, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(host: &str, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    /// Cluster from `AWS_HOST_Elasticsearch`
    pub fn from_env() -> Result<Self> {
        endpoint_override("Elasticsearch")
            .map(|host| Self::new(&host))
            .ok_or_else(|| AwsError::Config("AWS_HOST_Elasticsearch is not set".to_string()))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.host, path);
        debug!(method = %method, url = %url, "Elasticsearch request");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AwsError::Status(status.as_u16(), text));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = format!("{}/{}", self.host, index);
        let response = self.http.head(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AwsError::Status(status.as_u16(), url)),
        }
    }

    /// Create an index from scratch, dropping any existing one of the same name.
    ///
    /// Returns the delete (when there was one) and create responses.
    pub async fn create_index(&self, index: &str) -> Result<Vec<Value>> {
        let mut responses = Vec::new();
        if self.index_exists(index).await? {
            responses.push(self.send(Method::DELETE, index, None).await?);
        }
        responses.push(self.send(Method::PUT, index, Some(&index_settings())).await?);
        info!(index, "Created index");
        Ok(responses)
    }

    /// Index many documents with one `_bulk` request, creating the index if needed
    pub async fn bulk_index<T: Serialize>(&self, index: &str, documents: &[T]) -> Result<Value> {
        if !self.index_exists(index).await? {
            self.create_index(index).await?;
        }

        let action = serde_json::to_string(&json!({ "index": { "_index": index } }))?;
        let mut body = String::new();
        for document in documents {
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }

        let url = format!("{}/_bulk", self.host);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AwsError::Status(status.as_u16(), text));
        }
        info!(index, count = documents.len(), "Bulk indexed documents");
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn index_record<T: Serialize>(&self, index: &str, document: &T) -> Result<Value> {
        let body = serde_json::to_value(document)?;
        self.send(Method::POST, &format!("{}/_doc", index), Some(&body)).await
    }

    pub async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<Value> {
        self.send(Method::PUT, &format!("{}/_mapping", index), Some(mapping)).await
    }

    /// Turn on fielddata for a text field so it can be sorted and aggregated
    pub async fn enable_field_data(&self, index: &str, field: &str) -> Result<Value> {
        let mapping = json!({
            "properties": {
                field: { "type": "text", "fielddata": true }
            }
        });
        self.put_mapping(index, &mapping).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_index_replaces_existing() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ndc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/ndc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/ndc"))
            .and(body_json(index_settings()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true, "index": "ndc"})))
            .expect(1)
            .mount(&server)
            .await;

        let search = Search::new(&server.uri());
        let responses = search.create_index("ndc").await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["index"], "ndc");
    }

    #[tokio::test]
    async fn test_bulk_index_creates_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ndc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/ndc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("Content-Type", "application/x-ndjson"))
            .and(body_string_contains(r#"{"index":{"_index":"ndc"}}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": false, "items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let search = Search::new(&server.uri());
        let documents = vec![json!({"title": "a"}), json!({"title": "b"})];
        let response = search.bulk_index("ndc", &documents).await.unwrap();
        assert_eq!(response["errors"], false);
    }

    #[tokio::test]
    async fn test_enable_field_data() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/ndc/_mapping"))
            .and(body_json(json!({"properties": {"title": {"type": "text", "fielddata": true}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .mount(&server)
            .await;

        let search = Search::new(&server.uri());
        let response = search.enable_field_data("ndc", "title").await.unwrap();
        assert_eq!(response["acknowledged"], true);
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("mapper_parsing_exception"))
            .mount(&server)
            .await;

        let search = Search::new(&server.uri());
        let err = search.index_record("ndc", &json!({"x": 1})).await.unwrap_err();
        assert!(matches!(err, AwsError::Status(400, ref body) if body.contains("mapper_parsing")));
    }

    #[tokio::test]
    async fn test_slow_cluster_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let search = Search::with_timeout(&server.uri(), Duration::from_millis(200));
        let err = search.index_exists("ndc").await.unwrap_err();
        assert!(matches!(err, AwsError::Http(ref e) if e.is_timeout()));
    }

    #[test]
    fn test_from_env_requires_host() {
        std::env::remove_var("AWS_HOST_Elasticsearch");
        assert!(matches!(Search::from_env(), Err(AwsError::Config(_))));
    }
}
