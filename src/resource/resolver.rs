//! Name Resolver
//!
//! Maps logical names to the native addresses the provider expects.
//!
//! Queues have a direct name lookup on the provider side. Topics do not, so a
//! topic is found by walking the paginated topic listing and comparing the
//! short name of each ARN (the part after the last `:`) with the requested
//! name.

use super::backend::{BackendResult, QueueBackend, TopicBackend};
use super::fetcher::topic_pages;
use super::short_name;
use crate::error::{ApiError, ApiResult};
use futures::stream::{Stream, TryStreamExt};
use std::pin::pin;

/// First ARN in `pages` whose short name is exactly `name`
///
/// Consumes pages until a match is found or the stream ends. A failed page
/// aborts the search with that error; absence is only reported once every
/// page has been seen.
pub async fn find_topic_arn<S>(pages: S, name: &str) -> BackendResult<Option<String>>
where
    S: Stream<Item = BackendResult<Vec<String>>>,
{
    let mut pages = pin!(pages);

    while let Some(page) = pages.try_next().await? {
        if let Some(arn) = page
            .into_iter()
            .find(|arn| !arn.is_empty() && short_name(arn) == name)
        {
            return Ok(Some(arn));
        }
    }

    Ok(None)
}

/// Topic ARN for a topic name, `None` if no topic has that name
pub async fn resolve_topic_arn(topics: &dyn TopicBackend, name: &str) -> BackendResult<Option<String>> {
    tracing::debug!("Resolving topic '{}'", name);
    let arn = find_topic_arn(topic_pages(topics), name).await?;
    if arn.is_none() {
        tracing::debug!("No topic named '{}'", name);
    }
    Ok(arn)
}

/// Queue URL for a queue name
pub async fn resolve_queue_url(queues: &dyn QueueBackend, name: &str) -> ApiResult<String> {
    tracing::debug!("Resolving queue '{}'", name);
    queues.queue_url(name).await?.ok_or_else(|| {
        ApiError::not_found_with_details(
            "Queue not found",
            format!("Queue with name '{}' was not found", name),
        )
    })
}

/// Queue ARN for a queue name
pub async fn resolve_queue_arn(queues: &dyn QueueBackend, name: &str) -> ApiResult<String> {
    let queue_url = resolve_queue_url(queues, name).await?;
    Ok(queues.queue_arn(&queue_url).await?)
}
