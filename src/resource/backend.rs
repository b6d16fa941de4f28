//! Backend capabilities
//!
//! Each resource kind gets one trait listing the operations the gateway uses.
//! Handlers never see the transport: they receive a fresh handle per request
//! from a [`BackendProvider`].

use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub type BackendResult<T> = Result<T, BackendError>;

/// Message to enqueue
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessage {
    pub queue_url: String,
    pub body: String,
    pub delay_seconds: Option<i64>,
    /// Message attributes in the provider's `{name: {DataType, StringValue...}}` form
    pub attributes: Option<Map<String, Value>>,
}

/// Receive request, already clamped to the provider limits
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveMessages {
    pub queue_url: String,
    pub max_number: i64,
    pub wait_time_seconds: i64,
}

/// Message to publish on a topic
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    pub topic_arn: String,
    pub message: String,
    pub subject: Option<String>,
    pub attributes: Option<Map<String, Value>>,
}

/// Delivery protocol of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionProtocol {
    Sqs,
    Lambda,
}

impl SubscriptionProtocol {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sqs" => Some(SubscriptionProtocol::Sqs),
            "lambda" => Some(SubscriptionProtocol::Lambda),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionProtocol::Sqs => "sqs",
            SubscriptionProtocol::Lambda => "lambda",
        }
    }
}

/// Subscription to create
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribe {
    pub topic_arn: String,
    pub protocol: SubscriptionProtocol,
    pub endpoint: String,
}

impl Subscribe {
    /// Queue subscriptions get the raw message, not the SNS JSON envelope
    pub fn raw_message_delivery(&self) -> bool {
        self.protocol == SubscriptionProtocol::Sqs
    }
}

/// One page of a topic listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicPage {
    pub topic_arns: Vec<String>,
    pub next_token: Option<String>,
}

/// Primary key of a table item; all key values are sent as strings
#[derive(Debug, Clone, PartialEq)]
pub struct ItemKey {
    pub partition: (String, String),
    pub sort: Option<(String, String)>,
}

impl ItemKey {
    pub fn new(partition_name: &str, partition_value: &str) -> Self {
        Self {
            partition: (partition_name.to_string(), partition_value.to_string()),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort_name: &str, sort_value: &str) -> Self {
        self.sort = Some((sort_name.to_string(), sort_value.to_string()));
        self
    }

    /// Key attributes in order, partition first
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(&self.partition)
            .chain(self.sort.as_ref())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Managed queue operations
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Queue URL for a queue name, `None` if no such queue exists
    async fn queue_url(&self, name: &str) -> BackendResult<Option<String>>;

    /// `QueueArn` attribute of a queue
    async fn queue_arn(&self, queue_url: &str) -> BackendResult<String>;

    /// Returns the message id
    async fn send_message(&self, request: SendMessage) -> BackendResult<Option<String>>;

    /// Messages as returned by the provider (`MessageId`, `ReceiptHandle`, `Body`...)
    async fn receive_messages(&self, request: ReceiveMessages) -> BackendResult<Vec<Value>>;

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> BackendResult<()>;

    /// Asks the provider to purge; completion is asynchronous on its side
    async fn purge_queue(&self, queue_url: &str) -> BackendResult<()>;

    async fn list_queues(&self, prefix: Option<&str>) -> BackendResult<Vec<String>>;
}

/// Pub/sub topic operations
#[async_trait]
pub trait TopicBackend: Send + Sync {
    /// Creates the topic, or returns the existing ARN if it already exists
    async fn create_topic(&self, name: &str) -> BackendResult<String>;

    async fn list_topics(&self, next_token: Option<&str>) -> BackendResult<TopicPage>;

    /// Returns the message id
    async fn publish(&self, request: Publish) -> BackendResult<Option<String>>;

    /// Returns the subscription ARN
    async fn subscribe(&self, request: Subscribe) -> BackendResult<Option<String>>;
}

/// Key-value table operations
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Items from a single scan call, as plain JSON objects
    async fn scan(&self, table_name: &str) -> BackendResult<Vec<Value>>;

    async fn get_item(&self, table_name: &str, key: &ItemKey) -> BackendResult<Option<Value>>;
}

/// Hands out a fresh backend handle for each request
pub trait BackendProvider: Send + Sync {
    fn queues(&self) -> Box<dyn QueueBackend>;
    fn topics(&self) -> Box<dyn TopicBackend>;
    fn tables(&self) -> Box<dyn TableBackend>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_protocol_parse() {
        assert_eq!(SubscriptionProtocol::parse("sqs"), Some(SubscriptionProtocol::Sqs));
        assert_eq!(
            SubscriptionProtocol::parse("lambda"),
            Some(SubscriptionProtocol::Lambda)
        );
        assert_eq!(SubscriptionProtocol::parse("SQS"), None);
        assert_eq!(SubscriptionProtocol::parse("email"), None);
    }

    #[test]
    fn test_raw_delivery_only_for_queues() {
        let mut sub = Subscribe {
            topic_arn: "arn:aws:sns:us-east-1:000000000000:orders".to_string(),
            protocol: SubscriptionProtocol::Sqs,
            endpoint: "arn:aws:sqs:us-east-1:000000000000:q1".to_string(),
        };
        assert!(sub.raw_message_delivery());

        sub.protocol = SubscriptionProtocol::Lambda;
        assert!(!sub.raw_message_delivery());
    }

    #[test]
    fn test_item_key_attributes() {
        let key = ItemKey::new("id", "42");
        assert_eq!(key.attributes().collect::<Vec<_>>(), vec![("id", "42")]);

        let key = key.with_sort("created", "2024-01-01");
        assert_eq!(
            key.attributes().collect::<Vec<_>>(),
            vec![("id", "42"), ("created", "2024-01-01")]
        );
    }
}
