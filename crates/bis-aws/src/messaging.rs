//! SQS work queues with JSON message bodies

use crate::connect::sqs_client;
use crate::error::{AwsError, Result};
use aws_sdk_sqs::types::MessageAttributeValue;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A received message, ready to process and then delete
#[derive(Debug, Clone, Serialize)]
pub struct QueueMessage {
    pub receipt_handle: String,
    pub body: Value,
}

/// Queue name from a queue URL
pub fn queue_name(queue_url: &str) -> &str {
    queue_url.rsplit('/').next().unwrap_or(queue_url)
}

pub struct Messaging {
    sqs: aws_sdk_sqs::Client,
}

impl Messaging {
    pub fn new(sqs: aws_sdk_sqs::Client) -> Self {
        Self { sqs }
    }

    /// Messaging on the default credential chain, honoring `AWS_HOST_SQS`
    pub async fn from_env() -> Self {
        Self::new(sqs_client().await)
    }

    pub async fn list_queues(&self) -> Result<Vec<String>> {
        let output = self
            .sqs
            .list_queues()
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;
        Ok(output
            .queue_urls()
            .iter()
            .map(|url| queue_name(url).to_string())
            .collect())
    }

    /// URL of a queue, creating it when it does not exist yet
    async fn queue_url(&self, queue: &str) -> Result<String> {
        let output = self
            .sqs
            .create_queue()
            .queue_name(queue)
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;
        output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| AwsError::Config(format!("no URL returned for queue {}", queue)))
    }

    /// Peek at one message without hiding it from other consumers
    pub async fn get_message(&self, queue: &str) -> Result<Option<QueueMessage>> {
        let queue_url = self.queue_url(queue).await?;
        let output = self
            .sqs
            .receive_message()
            .queue_url(&queue_url)
            .max_number_of_messages(1)
            .message_attribute_names("All")
            .visibility_timeout(0)
            .wait_time_seconds(0)
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;

        let Some(message) = output.messages().first() else {
            debug!(queue, "Queue empty");
            return Ok(None);
        };
        let receipt_handle = message
            .receipt_handle()
            .ok_or_else(|| AwsError::Body("message without receipt handle".to_string()))?;
        let body = serde_json::from_str(message.body().unwrap_or("null"))?;

        Ok(Some(QueueMessage {
            receipt_handle: receipt_handle.to_string(),
            body,
        }))
    }

    /// Send a JSON body tagged with an `identifier` attribute; returns the message ID
    pub async fn post_message<T: Serialize>(
        &self,
        queue: &str,
        identifier: &str,
        body: &T,
    ) -> Result<String> {
        let queue_url = self.queue_url(queue).await?;
        let attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(identifier)
            .build()
            .map_err(|e| AwsError::Config(e.to_string()))?;

        let output = self
            .sqs
            .send_message()
            .queue_url(&queue_url)
            .message_attributes("identifier", attribute)
            .message_body(serde_json::to_string(body)?)
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;
        debug!(queue, identifier, "Posted message");

        output
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| AwsError::Body("no message ID returned".to_string()))
    }

    /// Delete a processed message; returns its receipt handle
    pub async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<String> {
        let queue_url = self.queue_url(queue).await?;
        self.sqs
            .delete_message()
            .queue_url(&queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;
        Ok(receipt_handle.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::config::{BehaviorVersion, Credentials, Region};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local_messaging(endpoint: &str) -> Messaging {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(endpoint)
            .build();
        Messaging::new(aws_sdk_sqs::Client::from_conf(config))
    }

    fn sqs_target(operation: &str) -> wiremock::matchers::HeaderExactMatcher {
        header("x-amz-target", format!("AmazonSQS.{}", operation).as_str())
    }

    fn sqs_json(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("Content-Type", "application/x-amz-json-1.0")
            .set_body_json(body)
    }

    async fn mount_queue(server: &MockServer) {
        Mock::given(method("POST"))
            .and(sqs_target("CreateQueue"))
            .and(body_partial_json(json!({"QueueName": "ndc-items"})))
            .respond_with(sqs_json(json!({
                "QueueUrl": format!("{}/000000000000/ndc-items", server.uri())
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_queue_name() {
        assert_eq!(
            queue_name("https://sqs.us-west-2.amazonaws.com/123456789012/ndc-items"),
            "ndc-items"
        );
        assert_eq!(queue_name("ndc-items"), "ndc-items");
    }

    #[test]
    fn test_message_serializes() {
        let message = QueueMessage {
            receipt_handle: "AQEB".to_string(),
            body: json!({"id": "abc"}),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["body"]["id"], "abc");
    }

    #[tokio::test]
    async fn test_get_message() {
        let server = MockServer::start().await;
        mount_queue(&server).await;
        Mock::given(method("POST"))
            .and(sqs_target("ReceiveMessage"))
            .and(body_partial_json(json!({"MaxNumberOfMessages": 1, "VisibilityTimeout": 0})))
            .respond_with(sqs_json(json!({
                "Messages": [{
                    "MessageId": "m-1",
                    "ReceiptHandle": "AQEB-1",
                    "Body": "{\"id\": \"abc\"}"
                }]
            })))
            .mount(&server)
            .await;

        let messaging = local_messaging(&server.uri());
        let message = messaging.get_message("ndc-items").await.unwrap().unwrap();
        assert_eq!(message.receipt_handle, "AQEB-1");
        assert_eq!(message.body["id"], "abc");
    }

    #[tokio::test]
    async fn test_get_message_empty_queue() {
        let server = MockServer::start().await;
        mount_queue(&server).await;
        Mock::given(method("POST"))
            .and(sqs_target("ReceiveMessage"))
            .respond_with(sqs_json(json!({})))
            .mount(&server)
            .await;

        let messaging = local_messaging(&server.uri());
        assert!(messaging.get_message("ndc-items").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_message_tags_identifier() {
        let server = MockServer::start().await;
        mount_queue(&server).await;
        Mock::given(method("POST"))
            .and(sqs_target("SendMessage"))
            .and(body_partial_json(json!({
                "MessageAttributes": {
                    "identifier": {"DataType": "String", "StringValue": "item-42"}
                }
            })))
            .respond_with(sqs_json(json!({"MessageId": "m-42"})))
            .expect(1)
            .mount(&server)
            .await;

        let messaging = local_messaging(&server.uri());
        let message_id = messaging
            .post_message("ndc-items", "item-42", &json!({"id": "item-42"}))
            .await
            .unwrap();
        assert_eq!(message_id, "m-42");
    }

    #[tokio::test]
    async fn test_delete_message() {
        let server = MockServer::start().await;
        mount_queue(&server).await;
        Mock::given(method("POST"))
            .and(sqs_target("DeleteMessage"))
            .and(body_partial_json(json!({"ReceiptHandle": "AQEB-1"})))
            .respond_with(sqs_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let messaging = local_messaging(&server.uri());
        let handle = messaging.delete_message("ndc-items", "AQEB-1").await.unwrap();
        assert_eq!(handle, "AQEB-1");
    }
}
