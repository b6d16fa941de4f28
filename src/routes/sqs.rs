//! Queue endpoints: send, receive, delete, purge, list

use super::Sqs;
use crate::error::ApiResult;
use crate::resource::resolver::resolve_queue_url;
use crate::resource::{ReceiveMessages, SendMessage};
use crate::validate::{require_json_body, QueryParams, RawBody};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Most messages a single receive may return
pub const MAX_RECEIVE_COUNT: i64 = 10;
/// Longest long-poll wait, in seconds
pub const MAX_WAIT_TIME_SECONDS: i64 = 20;

const PURGE_NOTE: &str = "Purge requested; the operation is asynchronous in SQS.";

/// Receive limits with defaults applied and out-of-range values clamped
///
/// `max_number` defaults to 1 and lands in `[1, 10]`, `wait_time_seconds`
/// defaults to 0 and lands in `[0, 20]`.
pub fn receive_limits(max_number: Option<i64>, wait_time_seconds: Option<i64>) -> (i64, i64) {
    (
        max_number.unwrap_or(1).clamp(1, MAX_RECEIVE_COUNT),
        wait_time_seconds.unwrap_or(0).clamp(0, MAX_WAIT_TIME_SECONDS),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Sent {
    pub message_id: Option<String>,
    pub queue_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Received {
    pub queue_name: String,
    pub messages: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub queue_name: String,
    pub receipt_handle: String,
    pub deleted: bool,
}

/// `purged` means the provider accepted the request, not that the queue is empty
#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeRequested {
    pub queue_name: String,
    pub purged: bool,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueList {
    pub queue_urls: Vec<String>,
}

/// POST /v1/sqs/send?queue_name=... `{"message", "delay_seconds"?, "attributes"?}`
///
/// `message` must be a string or a number; `attributes`, when given, an object.
pub async fn send_message(
    Sqs(sqs): Sqs,
    query: QueryParams,
    RawBody(body): RawBody,
) -> ApiResult<Json<Sent>> {
    let [queue_name] = query.require(["queue_name"])?;
    let body = require_json_body(&body, &["message"])?;

    let message = body.required_text("message")?;
    let delay_seconds = body.integer("delay_seconds")?;
    let attributes = body.object("attributes")?;

    let queue_url = resolve_queue_url(sqs.as_ref(), queue_name).await?;
    let message_id = sqs
        .send_message(SendMessage {
            queue_url,
            body: message,
            delay_seconds,
            attributes,
        })
        .await?;

    Ok(Json(Sent {
        message_id,
        queue_name: queue_name.to_string(),
    }))
}

/// GET /v1/sqs/messages?queue_name=...&max_number=...&wait_time_seconds=...
pub async fn receive_messages(Sqs(sqs): Sqs, query: QueryParams) -> ApiResult<Json<Received>> {
    let [queue_name] = query.require(["queue_name"])?;
    let (max_number, wait_time_seconds) = receive_limits(
        query.integer("max_number")?,
        query.integer("wait_time_seconds")?,
    );

    let queue_url = resolve_queue_url(sqs.as_ref(), queue_name).await?;
    let messages = sqs
        .receive_messages(ReceiveMessages {
            queue_url,
            max_number,
            wait_time_seconds,
        })
        .await?;
    tracing::debug!("Received {} messages from {}", messages.len(), queue_name);

    Ok(Json(Received {
        queue_name: queue_name.to_string(),
        messages,
    }))
}

/// DELETE /v1/sqs/messages?queue_name=...&receipt_handle=...
pub async fn delete_message(Sqs(sqs): Sqs, query: QueryParams) -> ApiResult<Json<Deleted>> {
    let [queue_name, receipt_handle] = query.require(["queue_name", "receipt_handle"])?;

    let queue_url = resolve_queue_url(sqs.as_ref(), queue_name).await?;
    sqs.delete_message(&queue_url, receipt_handle).await?;

    Ok(Json(Deleted {
        queue_name: queue_name.to_string(),
        receipt_handle: receipt_handle.to_string(),
        deleted: true,
    }))
}

/// DELETE /v1/sqs/messages/all?queue_name=...
///
/// A failed purge surfaces as a backend error, never as `purged: false`.
pub async fn purge_queue(Sqs(sqs): Sqs, query: QueryParams) -> ApiResult<Json<PurgeRequested>> {
    let [queue_name] = query.require(["queue_name"])?;

    let queue_url = resolve_queue_url(sqs.as_ref(), queue_name).await?;
    sqs.purge_queue(&queue_url).await?;
    tracing::info!("Purge requested for {}", queue_name);

    Ok(Json(PurgeRequested {
        queue_name: queue_name.to_string(),
        purged: true,
        note: PURGE_NOTE.to_string(),
    }))
}

/// GET /v1/sqs/queues?prefix=...
pub async fn list_queues(Sqs(sqs): Sqs, query: QueryParams) -> ApiResult<Json<QueueList>> {
    let queue_urls = sqs.list_queues(query.get("prefix")).await?;
    Ok(Json(QueueList { queue_urls }))
}
