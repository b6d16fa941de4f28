//! HTTP API
//!
//! Route table, shared state, and the extractors that hand each handler a
//! fresh backend handle for the capability it needs.

pub mod dynamodb;
pub mod sns;
pub mod sqs;

use crate::error::ApiError;
use crate::resource::{BackendProvider, QueueBackend, TableBackend, TopicBackend};
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use futures::FutureExt;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Router state: where backend handles come from
#[derive(Clone)]
pub struct AppState {
    backends: Arc<dyn BackendProvider>,
}

impl AppState {
    pub fn new(backends: Arc<dyn BackendProvider>) -> Self {
        Self { backends }
    }
}

/// SQS handle for the current request
pub struct Sqs(pub Box<dyn QueueBackend>);

/// SNS handle for the current request
pub struct Sns(pub Box<dyn TopicBackend>);

/// DynamoDB handle for the current request
pub struct DynamoDb(pub Box<dyn TableBackend>);

impl FromRequestParts<AppState> for Sqs {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Sqs(state.backends.queues()))
    }
}

impl FromRequestParts<AppState> for Sns {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Sns(state.backends.topics()))
    }
}

impl FromRequestParts<AppState> for DynamoDb {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(DynamoDb(state.backends.tables()))
    }
}

/// Build the HTTP API router on top of the given backends.
pub fn build_router(backends: Arc<dyn BackendProvider>) -> Router {
    Router::new()
        .route("/v1/dynamodb/all", get(dynamodb::get_all_items))
        .route("/v1/dynamodb/item", get(dynamodb::get_item))
        .route("/v1/sns/topics", post(sns::create_topic).get(sns::list_topics))
        .route("/v1/sns/publish", post(sns::publish_message))
        .route("/v1/sns/subscriptions", post(sns::create_subscription))
        .route("/v1/sqs/send", post(sqs::send_message))
        .route(
            "/v1/sqs/messages",
            get(sqs::receive_messages).delete(sqs::delete_message),
        )
        .route("/v1/sqs/messages/all", delete(sqs::purge_queue))
        .route("/v1/sqs/queues", get(sqs::list_queues))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(log_and_catch))
        .with_state(AppState::new(backends))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Log every request and turn a panicking handler into a JSON 500
async fn log_and_catch(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Internal server error".to_string());
            ApiError::Unexpected(message).into_response()
        }
    };

    tracing::info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}
