//! cloudgate
//!
//! HTTP gateway in front of SQS, SNS and DynamoDB. Queues, topics and tables
//! are addressed by name; the gateway resolves names to queue URLs and topic
//! ARNs, validates requests before touching the provider, and reports every
//! failure as a JSON error envelope.

pub mod aws;
pub mod config;
pub mod error;
pub mod resource;
pub mod routes;
pub mod validate;

pub use routes::{build_router, AppState};

/// Version injected at compile time via CLOUDGATE_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("CLOUDGATE_VERSION") {
    Some(v) => v,
    None => "dev",
};
