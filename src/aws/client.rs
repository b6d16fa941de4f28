//! AWS Client
//!
//! Main client for AWS APIs, combining the HTTP layer with the configured
//! region and per-service endpoints.

use super::http::AwsHttpClient;
use crate::config::Config;
use crate::resource::{BackendResult, ResourceKind};
use anyhow::Result;
use serde_json::Value;

/// Main AWS client
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct AwsClient {
    pub http: AwsHttpClient,
    pub region: String,
    sqs_url: String,
    sns_url: String,
    dynamodb_url: String,
}

impl AwsClient {
    /// Create a new AWS client
    pub fn new(config: &Config) -> Result<Self> {
        let http = AwsHttpClient::new()?;

        Ok(Self {
            http,
            region: config.region.clone(),
            sqs_url: config.endpoint_url(ResourceKind::Queue),
            sns_url: config.endpoint_url(ResourceKind::Topic),
            dynamodb_url: config.endpoint_url(ResourceKind::Table),
        })
    }

    /// Endpoint URL for a service
    pub fn endpoint(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Queue => &self.sqs_url,
            ResourceKind::Topic => &self.sns_url,
            ResourceKind::Table => &self.dynamodb_url,
        }
    }

    /// Call a JSON protocol action, e.g. `call_json(Queue, "AmazonSQS", "GetQueueUrl", ...)`
    pub async fn call_json(
        &self,
        kind: ResourceKind,
        target_prefix: &str,
        action: &str,
        body: Value,
    ) -> BackendResult<Value> {
        let target = format!("{}.{}", target_prefix, action);
        let url = format!("{}/", self.endpoint(kind));
        self.http.post_json(kind, &url, &target, &body).await
    }

    /// Call a query protocol action and return its `<Action>Result` member
    pub async fn call_query(
        &self,
        kind: ResourceKind,
        version: &str,
        action: &str,
        params: Vec<(String, String)>,
    ) -> BackendResult<Value> {
        let form = query_form(version, action, params);
        let url = format!("{}/", self.endpoint(kind));
        let response = self.http.post_query(kind, &url, &form).await?;
        Ok(unwrap_query_result(response, action))
    }
}

/// Form body of a query call: `Action` and `Version` first, then the parameters
fn query_form(version: &str, action: &str, params: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut form = vec![
        ("Action".to_string(), action.to_string()),
        ("Version".to_string(), version.to_string()),
    ];
    form.extend(params);
    form
}

/// `{"<Action>Response": {"<Action>Result": {...}}}` -> `{...}`
///
/// Responses that are not wrapped are returned unchanged.
fn unwrap_query_result(response: Value, action: &str) -> Value {
    let response_key = format!("{}Response", action);
    let result_key = format!("{}Result", action);

    let mut value = response;
    if let Some(inner) = value.get_mut(&response_key).map(Value::take) {
        value = inner;
    }
    if let Some(inner) = value.get_mut(&result_key).map(Value::take) {
        value = inner;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_query_result() {
        let response = json!({
            "CreateTopicResponse": {
                "CreateTopicResult": {"TopicArn": "arn:aws:sns:us-east-1:000000000000:orders"},
                "ResponseMetadata": {"RequestId": "abc"}
            }
        });
        assert_eq!(
            unwrap_query_result(response, "CreateTopic"),
            json!({"TopicArn": "arn:aws:sns:us-east-1:000000000000:orders"})
        );

        let bare = json!({"TopicArn": "x"});
        assert_eq!(unwrap_query_result(bare.clone(), "CreateTopic"), bare);
    }

    #[test]
    fn test_query_form_leads_with_action_and_version() {
        let form = query_form(
            "2010-03-31",
            "Publish",
            vec![("Message".to_string(), "hello".to_string())],
        );
        let pairs: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            [("Action", "Publish"), ("Version", "2010-03-31"), ("Message", "hello")]
        );
    }

    #[test]
    fn test_endpoints_from_config() {
        let mut config = Config::default();
        config.region = "eu-central-1".to_string();
        config.endpoints.set(ResourceKind::Topic, "");

        let client = AwsClient::new(&config).unwrap();
        assert_eq!(client.endpoint(ResourceKind::Queue), "http://localhost:4566");
        assert_eq!(
            client.endpoint(ResourceKind::Topic),
            "https://sns.eu-central-1.amazonaws.com"
        );
    }
}
