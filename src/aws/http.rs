//! HTTP utilities for AWS API calls
//!
//! Two wire protocols are spoken here: AWS JSON 1.0 (SQS, DynamoDB) and the
//! form-encoded AWS Query protocol (SNS), the latter asked to answer in JSON.

use crate::error::BackendError;
use crate::resource::{BackendResult, ResourceKind};
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging message payloads)
const MAX_LOG_BODY_LENGTH: usize = 200;

const AMZ_JSON: &str = "application/x-amz-json-1.0";
const AMZ_TARGET: &str = "X-Amz-Target";
/// Error code header sent by SQS for query-compatible JSON errors
const AMZN_QUERY_ERROR: &str = "x-amzn-query-error";

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP client wrapper for AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cloudgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Call an AWS JSON 1.0 action, e.g. target `AmazonSQS.SendMessage`
    pub async fn post_json(
        &self,
        kind: ResourceKind,
        url: &str,
        target: &str,
        body: &Value,
    ) -> BackendResult<Value> {
        tracing::debug!("POST {} ({})", url, target);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(AMZ_TARGET, target)
            .body(body.to_string())
            .send()
            .await
            .map_err(|source| BackendError::Transport { kind, source })?;

        read_response(kind, response).await
    }

    /// Call an AWS Query action; `params` must include `Action` and `Version`
    pub async fn post_query(
        &self,
        kind: ResourceKind,
        url: &str,
        params: &[(String, String)],
    ) -> BackendResult<Value> {
        let action = params
            .iter()
            .find(|(name, _)| name == "Action")
            .map(|(_, value)| value.as_str())
            .unwrap_or("-");
        tracing::debug!("POST {} (Action={})", url, action);

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(params)
            .send()
            .await
            .map_err(|source| BackendError::Transport { kind, source })?;

        read_response(kind, response).await
    }
}

/// Turn a response into JSON, or into a [`BackendError`] for non-2xx statuses
async fn read_response(kind: ResourceKind, response: Response) -> BackendResult<Value> {
    let status = response.status();
    let query_error = response
        .headers()
        .get(AMZN_QUERY_ERROR)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).to_string());
    let body = response
        .text()
        .await
        .map_err(|source| BackendError::Transport { kind, source })?;

    if !status.is_success() {
        tracing::error!("{} API error: {} - {}", kind, status, sanitize_for_log(&body));
        let mut error = parse_error_body(kind, status.as_u16(), &body);
        if let (BackendError::Service { code, .. }, Some(query_code)) = (&mut error, query_error) {
            *code = Some(query_code);
        }
        return Err(error);
    }

    // Handle empty response
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Malformed {
        kind,
        reason: format!("invalid JSON: {}", e),
    })
}

/// Extract code and message from an AWS error body
///
/// Understands the JSON protocol shape (`__type`, `message`), the JSON form of
/// query errors (`Error.Code`, `Error.Message`, optionally under
/// `ErrorResponse`), and falls back to scraping XML `<Code>`/`<Message>` tags.
pub fn parse_error_body(kind: ResourceKind, status: u16, body: &str) -> BackendError {
    let (code, message) = match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let error = json
                .get("ErrorResponse")
                .and_then(|v| v.get("Error"))
                .or_else(|| json.get("Error"))
                .unwrap_or(&json);
            let code = error
                .get("__type")
                .or_else(|| error.get("Code"))
                .or_else(|| error.get("code"))
                .and_then(Value::as_str)
                .map(String::from);
            let message = error
                .get("message")
                .or_else(|| error.get("Message"))
                .and_then(Value::as_str)
                .map(String::from);
            (code, message)
        }
        Err(_) => (xml_tag(body, "Code"), xml_tag(body, "Message")),
    };

    BackendError::Service {
        kind,
        status,
        code,
        message,
    }
}

fn xml_tag(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim().to_string())
}
