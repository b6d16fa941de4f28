//! Resource abstraction layer
//!
//! This module describes what the gateway needs from a backend, independent of
//! how it is reached, and implements name resolution on top of it.
//!
//! # Architecture
//!
//! - [`backend`] - Capability traits per resource kind and the per-request provider
//! - [`fetcher`] - Lazily paginated listings built on those traits
//! - [`resolver`] - Logical name to native address resolution
//!
//! # Example
//!
//! ```ignore
//! use cloudgate::resource::resolver;
//!
//! async fn publish_target(sns: &dyn TopicBackend) -> Result<Option<String>, BackendError> {
//!     resolver::resolve_topic_arn(sns, "orders").await
//! }
//! ```

pub mod backend;
pub mod fetcher;
pub mod resolver;

pub use backend::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource a request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Queue,
    Topic,
    Table,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Queue, ResourceKind::Topic, ResourceKind::Table];

    /// Provider service backing this kind of resource
    pub fn service(self) -> &'static str {
        match self {
            ResourceKind::Queue => "sqs",
            ResourceKind::Topic => "sns",
            ResourceKind::Table => "dynamodb",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service())
    }
}

/// Short name of a resource from its ARN
/// e.g., "arn:aws:sns:us-east-1:000000000000:orders" -> "orders"
pub fn short_name(arn: &str) -> &str {
    arn.rsplit(':').next().unwrap_or(arn)
}
