//! SNS backend (AWS Query protocol, JSON responses)

use super::client::AwsClient;
use crate::error::BackendError;
use crate::resource::{BackendResult, Publish, ResourceKind, Subscribe, TopicBackend, TopicPage};
use async_trait::async_trait;
use serde_json::{Map, Value};

const KIND: ResourceKind = ResourceKind::Topic;
const API_VERSION: &str = "2010-03-31";

/// Per-request SNS handle
pub struct SnsBackend {
    client: AwsClient,
}

impl SnsBackend {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

fn param(name: impl Into<String>, value: impl Into<String>) -> (String, String) {
    (name.into(), value.into())
}

/// Flatten message attributes into `MessageAttributes.entry.N.*` parameters
///
/// Object values are expected in the `{DataType, StringValue, BinaryValue}`
/// form; scalar values are sent as `String` attributes.
pub fn message_attribute_params(attributes: &Map<String, Value>) -> Vec<(String, String)> {
    let mut params = Vec::new();

    for (i, (name, value)) in attributes.iter().enumerate() {
        let prefix = format!("MessageAttributes.entry.{}", i + 1);
        params.push(param(format!("{}.Name", prefix), name.as_str()));

        match value {
            Value::Object(fields) => {
                for field in ["DataType", "StringValue", "BinaryValue"] {
                    if let Some(v) = fields.get(field).and_then(Value::as_str) {
                        params.push(param(format!("{}.Value.{}", prefix, field), v));
                    }
                }
            }
            Value::String(s) => {
                params.push(param(format!("{}.Value.DataType", prefix), "String"));
                params.push(param(format!("{}.Value.StringValue", prefix), s.as_str()));
            }
            other => {
                params.push(param(format!("{}.Value.DataType", prefix), "String"));
                params.push(param(format!("{}.Value.StringValue", prefix), other.to_string()));
            }
        }
    }

    params
}

fn string_field(response: &Value, field: &str) -> Option<String> {
    response.get(field).and_then(Value::as_str).map(String::from)
}

#[async_trait]
impl TopicBackend for SnsBackend {
    async fn create_topic(&self, name: &str) -> BackendResult<String> {
        let response = self
            .client
            .call_query(KIND, API_VERSION, "CreateTopic", vec![param("Name", name)])
            .await?;

        string_field(&response, "TopicArn").ok_or_else(|| BackendError::Malformed {
            kind: KIND,
            reason: "CreateTopic response has no TopicArn".to_string(),
        })
    }

    async fn list_topics(&self, next_token: Option<&str>) -> BackendResult<TopicPage> {
        let params = next_token
            .map(|token| vec![param("NextToken", token)])
            .unwrap_or_default();
        let response = self.client.call_query(KIND, API_VERSION, "ListTopics", params).await?;

        let topic_arns = response
            .get("Topics")
            .and_then(Value::as_array)
            .map(|topics| {
                topics
                    .iter()
                    .filter_map(|topic| topic.get("TopicArn").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(TopicPage {
            topic_arns,
            next_token: string_field(&response, "NextToken"),
        })
    }

    async fn publish(&self, request: Publish) -> BackendResult<Option<String>> {
        let mut params = vec![
            param("TopicArn", request.topic_arn),
            param("Message", request.message),
        ];
        if let Some(subject) = request.subject.filter(|s| !s.is_empty()) {
            params.push(param("Subject", subject));
        }
        if let Some(attributes) = request.attributes.as_ref().filter(|a| !a.is_empty()) {
            params.extend(message_attribute_params(attributes));
        }

        let response = self.client.call_query(KIND, API_VERSION, "Publish", params).await?;
        Ok(string_field(&response, "MessageId"))
    }

    async fn subscribe(&self, request: Subscribe) -> BackendResult<Option<String>> {
        let raw_delivery = request.raw_message_delivery();
        let mut params = vec![
            param("TopicArn", request.topic_arn),
            param("Protocol", request.protocol.as_str()),
            param("Endpoint", request.endpoint),
        ];
        if raw_delivery {
            params.push(param("Attributes.entry.1.key", "RawMessageDelivery"));
            params.push(param("Attributes.entry.1.value", "true"));
        }

        let response = self.client.call_query(KIND, API_VERSION, "Subscribe", params).await?;
        Ok(string_field(&response, "SubscriptionArn"))
    }
}
