//! AWS API interaction module
//!
//! Implements the backend traits of [`crate::resource`] against SQS, SNS and
//! DynamoDB, or any emulator speaking the same protocols (LocalStack).
//!
//! # Module Structure
//!
//! - [`client`] - Endpoint/region aware client shared by all services
//! - [`http`] - Wire protocol helpers and error body parsing
//! - [`sqs`] - Queue backend
//! - [`sns`] - Topic backend
//! - [`dynamodb`] - Table backend
//!
//! # Example
//!
//! ```ignore
//! use cloudgate::aws::AwsBackends;
//! use cloudgate::config::Config;
//!
//! fn example() -> anyhow::Result<()> {
//!     let backends = AwsBackends::new(&Config::default())?;
//!     let sqs = backends.queues();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dynamodb;
pub mod http;
pub mod sns;
pub mod sqs;

use crate::config::Config;
use crate::resource::{BackendProvider, QueueBackend, TableBackend, TopicBackend};
use anyhow::Result;
use client::AwsClient;

/// Backend provider handing out AWS service handles
#[derive(Clone)]
pub struct AwsBackends {
    client: AwsClient,
}

impl AwsBackends {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: AwsClient::new(config)?,
        })
    }
}

impl BackendProvider for AwsBackends {
    fn queues(&self) -> Box<dyn QueueBackend> {
        Box::new(sqs::SqsBackend::new(self.client.clone()))
    }

    fn topics(&self) -> Box<dyn TopicBackend> {
        Box::new(sns::SnsBackend::new(self.client.clone()))
    }

    fn tables(&self) -> Box<dyn TableBackend> {
        Box::new(dynamodb::DynamoDbBackend::new(self.client.clone()))
    }
}
