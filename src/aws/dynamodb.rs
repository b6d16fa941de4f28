//! DynamoDB backend (AWS JSON 1.0 protocol)
//!
//! DynamoDB returns typed attribute values (`{"S": "abc"}`, `{"N": "42"}`...).
//! Items are converted to plain JSON before they leave this module.

use super::client::AwsClient;
use crate::resource::{BackendResult, ItemKey, ResourceKind, TableBackend};
use async_trait::async_trait;
use serde_json::{json, Map, Number, Value};

const KIND: ResourceKind = ResourceKind::Table;
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// Per-request DynamoDB handle
pub struct DynamoDbBackend {
    client: AwsClient,
}

impl DynamoDbBackend {
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

/// Number attribute as a JSON number when representable, else as its text
fn number_value(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}

/// Convert one typed attribute value to plain JSON
pub fn attribute_to_json(attribute: &Value) -> Value {
    let Some((tag, inner)) = attribute
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
    else {
        return attribute.clone();
    };

    match (tag.as_str(), inner) {
        ("S", _) | ("B", _) | ("BOOL", _) => inner.clone(),
        ("NULL", _) => Value::Null,
        ("N", Value::String(n)) => number_value(n),
        ("M", Value::Object(map)) => item_to_json(map),
        ("L", Value::Array(list)) => Value::Array(list.iter().map(attribute_to_json).collect()),
        ("SS", Value::Array(set)) | ("BS", Value::Array(set)) => Value::Array(set.clone()),
        ("NS", Value::Array(set)) => Value::Array(
            set.iter()
                .map(|n| n.as_str().map(number_value).unwrap_or_else(|| n.clone()))
                .collect(),
        ),
        _ => attribute.clone(),
    }
}

/// Convert a typed item to a plain JSON object
pub fn item_to_json(item: &Map<String, Value>) -> Value {
    Value::Object(
        item.iter()
            .map(|(name, value)| (name.clone(), attribute_to_json(value)))
            .collect(),
    )
}

/// Key in DynamoDB form; every key value is a string attribute
fn key_to_attributes(key: &ItemKey) -> Value {
    Value::Object(
        key.attributes()
            .map(|(name, value)| (name.to_string(), json!({ "S": value })))
            .collect(),
    )
}

#[async_trait]
impl TableBackend for DynamoDbBackend {
    async fn scan(&self, table_name: &str) -> BackendResult<Vec<Value>> {
        let response = self
            .client
            .call_json(KIND, TARGET_PREFIX, "Scan", json!({ "TableName": table_name }))
            .await?;

        Ok(response
            .get("Items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(item_to_json)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_item(&self, table_name: &str, key: &ItemKey) -> BackendResult<Option<Value>> {
        let response = self
            .client
            .call_json(
                KIND,
                TARGET_PREFIX,
                "GetItem",
                json!({ "TableName": table_name, "Key": key_to_attributes(key) }),
            )
            .await?;

        Ok(response
            .get("Item")
            .and_then(Value::as_object)
            .filter(|item| !item.is_empty())
            .map(item_to_json))
    }
}
