//! Table read endpoints

use super::DynamoDb;
use crate::error::{ApiError, ApiResult};
use crate::resource::ItemKey;
use crate::validate::QueryParams;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct TableItems {
    pub items: Vec<Value>,
    pub table_name: String,
}

/// GET /v1/dynamodb/all?table_name=...
///
/// Every item a single scan returns. No continuation is followed.
pub async fn get_all_items(
    DynamoDb(dynamodb): DynamoDb,
    query: QueryParams,
) -> ApiResult<Json<TableItems>> {
    let [table_name] = query.require(["table_name"])?;

    let items = dynamodb.scan(table_name).await?;
    tracing::debug!("Scanned {} items from {}", items.len(), table_name);

    Ok(Json(TableItems {
        items,
        table_name: table_name.to_string(),
    }))
}

/// GET /v1/dynamodb/item?table_name=...&partition_key_name=...&partition_key_value=...
///
/// `sort_key_name` and `sort_key_value` are only used when both are given.
pub async fn get_item(DynamoDb(dynamodb): DynamoDb, query: QueryParams) -> ApiResult<Json<Value>> {
    let [table_name, partition_key_name, partition_key_value] =
        query.require(["table_name", "partition_key_name", "partition_key_value"])?;

    let mut key = ItemKey::new(partition_key_name, partition_key_value);
    if let (Some(sort_key_name), Some(sort_key_value)) =
        (query.get("sort_key_name"), query.get("sort_key_value"))
    {
        key = key.with_sort(sort_key_name, sort_key_value);
    }

    dynamodb
        .get_item(table_name, &key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found."))
}
