//! Topic endpoints: create, list, publish, subscribe

use super::{Sns, Sqs};
use crate::error::{ApiError, ApiResult};
use crate::resource::fetcher::{fetch_topics, TopicSummary};
use crate::resource::resolver::{resolve_queue_arn, resolve_topic_arn};
use crate::resource::{Publish, Subscribe, SubscriptionProtocol, TopicBackend};
use crate::validate::{require_json_body, QueryParams, RawBody};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedTopic {
    pub name: String,
    pub topic_arn: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicList {
    pub topics: Vec<TopicSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Published {
    pub message_id: Option<String>,
    pub topic_arn: String,
    pub topic_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Subscribed {
    pub subscription_arn: Option<String>,
    pub topic_arn: String,
    pub protocol: String,
    pub endpoint: String,
}

/// A resource given either by ARN or by name
enum Reference<'a> {
    Arn(&'a str),
    Name(&'a str),
}

fn topic_not_found(name: &str) -> ApiError {
    ApiError::not_found_with_details(
        "Topic not found",
        format!("Topic with name '{}' was not found", name),
    )
}

/// Resolve a topic name, treating absence as 404
async fn require_topic_arn(sns: &dyn TopicBackend, name: &str) -> ApiResult<String> {
    resolve_topic_arn(sns, name)
        .await?
        .ok_or_else(|| topic_not_found(name))
}

/// POST /v1/sns/topics `{"name": "..."}`
///
/// Creating an existing topic returns its ARN.
pub async fn create_topic(
    Sns(sns): Sns,
    RawBody(body): RawBody,
) -> ApiResult<(StatusCode, Json<CreatedTopic>)> {
    let body = require_json_body(&body, &["name"])?;
    let name = body.required_text("name")?;

    let topic_arn = sns.create_topic(&name).await?;
    tracing::info!("Topic {} -> {}", name, topic_arn);

    Ok((StatusCode::CREATED, Json(CreatedTopic { name, topic_arn })))
}

/// GET /v1/sns/topics
pub async fn list_topics(Sns(sns): Sns) -> ApiResult<Json<TopicList>> {
    let topics = fetch_topics(sns.as_ref()).await?;
    Ok(Json(TopicList { topics }))
}

/// POST /v1/sns/publish?topic_name=... `{"message", "subject"?, "attributes"?}`
///
/// The topic must already exist; it is never created here. `message` and
/// `subject` must be strings or numbers, `attributes` an object.
pub async fn publish_message(
    Sns(sns): Sns,
    query: QueryParams,
    RawBody(body): RawBody,
) -> ApiResult<Json<Published>> {
    let [topic_name] = query.require(["topic_name"])?;
    let body = require_json_body(&body, &["message"])?;

    let request_message = body.required_text("message")?;
    let subject = body.text("subject")?;
    let attributes = body.object("attributes")?;

    let topic_arn = require_topic_arn(sns.as_ref(), topic_name).await?;

    let message_id = sns
        .publish(Publish {
            topic_arn: topic_arn.clone(),
            message: request_message,
            subject,
            attributes,
        })
        .await?;

    Ok(Json(Published {
        message_id,
        topic_arn,
        topic_name: topic_name.to_string(),
    }))
}

/// POST /v1/sns/subscriptions
///
/// Body: `type` ("sqs" | "lambda"), `topic_arn` or `topic_name`, then
/// `queue_arn` or `queue_name` for sqs, `lambda_arn` for lambda. Queue
/// subscriptions ask for raw message delivery.
///
/// Lambda subscriptions do not grant SNS permission to invoke the function;
/// that has to be set up on the function beforehand.
pub async fn create_subscription(
    Sns(sns): Sns,
    Sqs(sqs): Sqs,
    RawBody(body): RawBody,
) -> ApiResult<(StatusCode, Json<Subscribed>)> {
    let body = require_json_body(&body, &[])?;

    let protocol = body
        .str("type")
        .and_then(SubscriptionProtocol::parse)
        .ok_or_else(|| ApiError::invalid_argument("type must be 'sqs' or 'lambda'"))?;

    let topic = match (body.str("topic_arn"), body.str("topic_name")) {
        (Some(arn), _) => Reference::Arn(arn),
        (None, Some(name)) => Reference::Name(name),
        (None, None) => {
            return Err(ApiError::invalid_argument("topic_arn or topic_name is required"));
        }
    };

    let target = match protocol {
        SubscriptionProtocol::Sqs => match (body.str("queue_arn"), body.str("queue_name")) {
            (Some(arn), _) => Reference::Arn(arn),
            (None, Some(name)) => Reference::Name(name),
            (None, None) => {
                return Err(ApiError::invalid_argument(
                    "queue_arn or queue_name is required for type 'sqs'",
                ));
            }
        },
        SubscriptionProtocol::Lambda => match body.str("lambda_arn") {
            Some(arn) => Reference::Arn(arn),
            None => {
                return Err(ApiError::invalid_argument(
                    "lambda_arn is required for type 'lambda'",
                ));
            }
        },
    };

    let topic_arn = match topic {
        Reference::Arn(arn) => arn.to_string(),
        Reference::Name(name) => require_topic_arn(sns.as_ref(), name).await?,
    };

    // Only queues are ever given by name
    let endpoint = match target {
        Reference::Arn(arn) => arn.to_string(),
        Reference::Name(name) => resolve_queue_arn(sqs.as_ref(), name).await?,
    };

    let subscription_arn = sns
        .subscribe(Subscribe {
            topic_arn: topic_arn.clone(),
            protocol,
            endpoint: endpoint.clone(),
        })
        .await?;
    tracing::info!(
        "Subscribed {} ({}) to {}",
        endpoint,
        protocol.as_str(),
        topic_arn
    );

    Ok((
        StatusCode::CREATED,
        Json(Subscribed {
            subscription_arn,
            topic_arn,
            protocol: protocol.as_str().to_string(),
            endpoint,
        }),
    ))
}
