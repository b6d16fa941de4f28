//! SQS backend (AWS JSON 1.0 protocol)

use super::client::AwsClient;
use crate::error::BackendError;
use crate::resource::{BackendResult, QueueBackend, ReceiveMessages, ResourceKind, SendMessage};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const KIND: ResourceKind = ResourceKind::Queue;
const TARGET_PREFIX: &str = "AmazonSQS";

/// Error codes SQS uses for a queue that does not exist
const NO_SUCH_QUEUE: &[&str] = &[
    "QueueDoesNotExist",
    "AWS.SimpleQueueService.NonExistentQueue",
];

/// Per-request SQS handle
pub struct SqsBackend {
    client: AwsClient,
}

impl SqsBackend {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }

    async fn call(&self, action: &str, body: Value) -> BackendResult<Value> {
        self.client.call_json(KIND, TARGET_PREFIX, action, body).await
    }
}

fn string_field(response: &Value, field: &str) -> Option<String> {
    response.get(field).and_then(Value::as_str).map(String::from)
}

#[async_trait]
impl QueueBackend for SqsBackend {
    async fn queue_url(&self, name: &str) -> BackendResult<Option<String>> {
        match self.call("GetQueueUrl", json!({ "QueueName": name })).await {
            Ok(response) => match string_field(&response, "QueueUrl") {
                Some(url) => Ok(Some(url)),
                None => Err(BackendError::Malformed {
                    kind: KIND,
                    reason: "GetQueueUrl response has no QueueUrl".to_string(),
                }),
            },
            Err(err) if err.has_code(NO_SUCH_QUEUE) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn queue_arn(&self, queue_url: &str) -> BackendResult<String> {
        let response = self
            .call(
                "GetQueueAttributes",
                json!({ "QueueUrl": queue_url, "AttributeNames": ["QueueArn"] }),
            )
            .await?;

        response
            .get("Attributes")
            .and_then(|attrs| attrs.get("QueueArn"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| BackendError::Malformed {
                kind: KIND,
                reason: "GetQueueAttributes response has no QueueArn".to_string(),
            })
    }

    async fn send_message(&self, request: SendMessage) -> BackendResult<Option<String>> {
        let mut body = Map::new();
        body.insert("QueueUrl".into(), Value::String(request.queue_url));
        body.insert("MessageBody".into(), Value::String(request.body));
        if let Some(delay) = request.delay_seconds {
            body.insert("DelaySeconds".into(), json!(delay));
        }
        if let Some(attributes) = request.attributes.filter(|a| !a.is_empty()) {
            body.insert("MessageAttributes".into(), Value::Object(attributes));
        }

        let response = self.call("SendMessage", Value::Object(body)).await?;
        Ok(string_field(&response, "MessageId"))
    }

    async fn receive_messages(&self, request: ReceiveMessages) -> BackendResult<Vec<Value>> {
        let response = self
            .call(
                "ReceiveMessage",
                json!({
                    "QueueUrl": request.queue_url,
                    "MaxNumberOfMessages": request.max_number,
                    "WaitTimeSeconds": request.wait_time_seconds,
                    "MessageAttributeNames": ["All"],
                }),
            )
            .await?;

        Ok(response
            .get("Messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> BackendResult<()> {
        self.call(
            "DeleteMessage",
            json!({ "QueueUrl": queue_url, "ReceiptHandle": receipt_handle }),
        )
        .await?;
        Ok(())
    }

    async fn purge_queue(&self, queue_url: &str) -> BackendResult<()> {
        self.call("PurgeQueue", json!({ "QueueUrl": queue_url })).await?;
        Ok(())
    }

    async fn list_queues(&self, prefix: Option<&str>) -> BackendResult<Vec<String>> {
        let body = match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => json!({ "QueueNamePrefix": prefix }),
            None => json!({}),
        };
        let response = self.call("ListQueues", body).await?;

        Ok(response
            .get("QueueUrls")
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default())
    }
}
