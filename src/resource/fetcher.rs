//! Resource Fetcher
//!
//! Paginated listings exposed as lazy streams of pages.

use super::backend::{BackendResult, TopicBackend};
use super::{short_name, ResourceKind};
use crate::error::BackendError;
use futures::stream::{self, Stream, TryStreamExt};
use std::pin::pin;

/// Where the next listing call starts
enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Stream of topic ARN pages, one backend call per page
///
/// Pages are only requested as the stream is polled, so a consumer that stops
/// early never issues the remaining calls.
pub fn topic_pages(
    topics: &dyn TopicBackend,
) -> impl Stream<Item = BackendResult<Vec<String>>> + Send + '_ {
    stream::try_unfold(PageCursor::First, move |cursor| next_topic_page(topics, cursor))
}

async fn next_topic_page(
    topics: &dyn TopicBackend,
    cursor: PageCursor,
) -> BackendResult<Option<(Vec<String>, PageCursor)>> {
    let token = match cursor {
        PageCursor::Done => return Ok(None),
        PageCursor::First => None,
        PageCursor::Next(token) => Some(token),
    };

    let page = topics.list_topics(token.as_deref()).await?;
    tracing::debug!(
        "list_topics page: {} topics, more={}",
        page.topic_arns.len(),
        page.next_token.is_some()
    );

    let next = match page.next_token {
        Some(next) if !next.is_empty() => {
            if token.as_deref() == Some(next.as_str()) {
                return Err(BackendError::Malformed {
                    kind: ResourceKind::Topic,
                    reason: format!("ListTopics returned NextToken {} again", next),
                });
            }
            PageCursor::Next(next)
        }
        _ => PageCursor::Done,
    };

    Ok(Some((page.topic_arns, next)))
}

/// Topic summary returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TopicSummary {
    pub topic_arn: String,
    pub name: String,
}

/// Fetch all topics (auto-paginate)
pub async fn fetch_topics(topics: &dyn TopicBackend) -> BackendResult<Vec<TopicSummary>> {
    let mut all_topics = Vec::new();
    let mut pages = pin!(topic_pages(topics));

    while let Some(page) = pages.try_next().await? {
        all_topics.extend(page.into_iter().filter(|arn| !arn.is_empty()).map(|arn| {
            TopicSummary {
                name: short_name(&arn).to_string(),
                topic_arn: arn,
            }
        }));
    }

    Ok(all_topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Publish, Subscribe, TopicPage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves fixed pages keyed by token and records every token requested
    struct PagedTopics {
        pages: Vec<TopicPage>,
        calls: Mutex<Vec<Option<String>>>,
        fail_on: Option<usize>,
    }

    impl PagedTopics {
        fn new(pages: Vec<Vec<&str>>) -> Self {
            let count = pages.len();
            let pages = pages
                .into_iter()
                .enumerate()
                .map(|(i, arns)| TopicPage {
                    topic_arns: arns.into_iter().map(String::from).collect(),
                    next_token: (i + 1 < count).then(|| format!("token-{}", i + 1)),
                })
                .collect();
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl TopicBackend for PagedTopics {
        async fn create_topic(&self, _name: &str) -> BackendResult<String> {
            unimplemented!()
        }

        async fn list_topics(&self, next_token: Option<&str>) -> BackendResult<TopicPage> {
            let index = next_token
                .and_then(|t| t.strip_prefix("token-"))
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            self.calls.lock().unwrap().push(next_token.map(String::from));
            if self.fail_on == Some(index) {
                return Err(BackendError::Service {
                    kind: ResourceKind::Topic,
                    status: 500,
                    code: Some("InternalError".into()),
                    message: Some("listing failed".into()),
                });
            }
            Ok(self.pages[index].clone())
        }

        async fn publish(&self, _request: Publish) -> BackendResult<Option<String>> {
            unimplemented!()
        }

        async fn subscribe(&self, _request: Subscribe) -> BackendResult<Option<String>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_fetch_topics_follows_every_page() {
        let backend = PagedTopics::new(vec![
            vec!["arn:aws:sns:us-east-1:000000000000:a"],
            vec!["arn:aws:sns:us-east-1:000000000000:b", ""],
            vec!["arn:aws:sns:us-east-1:000000000000:c"],
        ]);

        let topics = fetch_topics(&backend).await.unwrap();
        let names: Vec<_> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec![None, Some("token-1".to_string()), Some("token-2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut backend = PagedTopics::new(vec![vec!["arn:aws:sns:r:1:a"], vec!["arn:aws:sns:r:1:b"]]);
        backend.fail_on = Some(1);

        let err = fetch_topics(&backend).await.unwrap_err();
        assert_eq!(err.message(), "listing failed");
    }

    #[tokio::test]
    async fn test_repeated_token_stops_listing() {
        let mut backend = PagedTopics::new(vec![
            vec!["arn:aws:sns:r:1:a"],
            vec!["arn:aws:sns:r:1:b"],
            vec!["arn:aws:sns:r:1:c"],
        ]);
        backend.pages[1].next_token = Some("token-1".to_string());

        let err = fetch_topics(&backend).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Malformed {
                kind: ResourceKind::Topic,
                ..
            }
        ));
        assert!(err.message().contains("token-1"));
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec![None, Some("token-1".to_string())]
        );
    }
}
